//! # Toneweave
//!
//! **Style-faithful reply drafting from a user's own message history.**
//!
//! Toneweave stores a user's historical utterances ("tone samples"),
//! embeds them, and — given an incoming message from a conversation
//! partner — retrieves the most relevant samples, re-ranks them for
//! diversity (MMR), assembles them with recent dialogue and relationship
//! metadata into a structured prompt, and asks a generation model for a
//! reply pair in the user's voice: one agreeing, one declining.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │  Import  │──▶│ Embed batch │──▶│  SQLite   │
//! │  (JSONL) │   │  (backfill) │   │ (vectors) │
//! └──────────┘   └─────────────┘   └────┬─────┘
//!                                       │
//!                         ┌─────────────┤
//!                         ▼             ▼
//!                   ┌──────────┐  ┌───────────────┐
//!                   │   CLI    │  │  ReplyEngine   │
//!                   │  (tone)  │  │ (retrieve→MMR │
//!                   └──────────┘  │  →prompt→LLM) │
//!                                 └───────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. **Import** ([`import`]) loads tone samples from JSON Lines with
//!    sha-256 deduplication; embeddings are left empty.
//! 2. The **embedding backfill** ([`embed_cmd`]) batches pending samples
//!    through the **embedding provider** ([`embedding`]) and writes each
//!    vector atomically.
//! 3. A reply request runs the core pipeline ([`toneweave_core::engine`]):
//!    candidate retrieval, MMR re-ranking, concurrent context assembly,
//!    prompt compilation, generation, and dual-reply parsing.
//! 4. Results are exposed via the **CLI** (`tone reply single|dual`).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite implementation of the core `Store` trait |
//! | [`embedding`] | OpenAI embedding provider with retry/backoff |
//! | [`generation`] | OpenAI chat-completion provider |
//! | [`embed_cmd`] | Embedding backfill: `pending` and `rebuild` |
//! | [`import`] | JSONL tone-sample loader with dedup |
//! | [`style_cmd`] | Custom style-guideline management |
//! | [`partner_cmd`] | Partner and relationship management |
//! | [`reply_cmd`] | Reply generation commands |
//! | [`stats`] | Database statistics overview |
//!
//! ## Configuration
//!
//! Toneweave is configured via a TOML file (default: `config/tone.toml`).
//! See [`config`] for all available options and [`config::load_config`]
//! for validation rules.

pub mod config;
pub mod db;
pub mod embed_cmd;
pub mod embedding;
pub mod generation;
pub mod import;
pub mod migrate;
pub mod partner_cmd;
pub mod reply_cmd;
pub mod sqlite_store;
pub mod stats;
pub mod style_cmd;

pub use sqlite_store::SqliteStore;
pub use toneweave_core::{DualReply, EngineParams, ReplyEngine, ReplyError};
