//! # Toneweave CLI (`tone`)
//!
//! The `tone` binary is the operational interface for Toneweave. It
//! provides commands for database initialization, tone-sample import,
//! embedding backfill, relationship management, and reply generation.
//!
//! ## Usage
//!
//! ```bash
//! tone --config ./config/tone.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tone init` | Create the SQLite database and run schema migrations |
//! | `tone import <file> --user <id>` | Import tone samples from a JSONL file |
//! | `tone embed pending` | Embed samples that are missing embeddings |
//! | `tone embed rebuild` | Delete and regenerate all embeddings |
//! | `tone partner add <name>` | Register a conversation partner |
//! | `tone relate <user> <partner> --category <tag>` | Record how a user addresses a partner |
//! | `tone style set/show/clear` | Manage custom style guidelines |
//! | `tone reply single/dual` | Generate a reply (pair) to an incoming message |
//! | `tone stats` | Show database statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! tone init --config ./config/tone.toml
//!
//! # Import a user's utterances and embed them
//! tone import samples.jsonl --user alice --user-name "Alice"
//! tone embed pending
//!
//! # Register who Alice talks to
//! tone partner add "Bob" --id bob
//! tone relate alice bob --category FRIEND_CLOSE --politeness CASUAL --vibe PLAYFUL
//!
//! # Draft an agree/decline pair in Alice's voice
//! tone reply dual --user alice --partner bob "free this weekend?"
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use toneweave::{config, embed_cmd, import, migrate, partner_cmd, reply_cmd, stats, style_cmd};

/// Toneweave CLI — style-faithful reply drafting from a user's own
/// message history.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "tone",
    about = "Toneweave — style-faithful reply drafting from a user's own message history",
    version,
    long_about = "Toneweave retrieves a user's most relevant historical utterances for an \
    incoming message, re-ranks them for diversity (MMR), assembles them with recent dialogue \
    and relationship metadata into a structured prompt, and generates an agreeing and a \
    declining reply in the user's voice."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tone.toml`. All database, retrieval,
    /// embedding, and generation settings are read from this file.
    #[arg(long, global = true, default_value = "./config/tone.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (users,
    /// partners, relationships, dialogue_turns, tone_samples,
    /// style_profiles). This command is idempotent — running it multiple
    /// times is safe.
    Init,

    /// Import tone samples from a JSON Lines file.
    ///
    /// One record per line: `{"text": "...", "category": "...",
    /// "politeness": "...", "vibe": "..."}`. Duplicate texts for the same
    /// user are skipped. Embeddings are generated separately via
    /// `tone embed pending`.
    Import {
        /// Path to the JSONL file.
        file: PathBuf,

        /// User the samples belong to (created if missing).
        #[arg(long)]
        user: String,

        /// Display name for a newly created user (defaults to the id).
        #[arg(long)]
        user_name: Option<String>,
    },

    /// Manage sample embeddings.
    #[command(subcommand)]
    Embed(EmbedCommands),

    /// Register a conversation partner.
    Partner {
        #[command(subcommand)]
        command: PartnerCommands,
    },

    /// Record how a user addresses a partner.
    Relate {
        /// User id.
        user: String,

        /// Partner id.
        partner: String,

        /// Relationship category tag (e.g. FRIEND_CLOSE, COWORKER).
        #[arg(long)]
        category: String,

        /// Politeness level tag (FORMAL, POLITE, CASUAL).
        #[arg(long)]
        politeness: Option<String>,

        /// Vibe tag (SERIOUS, CALM, PLAYFUL, ENERGETIC, CARING, DIRECT).
        #[arg(long)]
        vibe: Option<String>,
    },

    /// Manage custom style guidelines.
    #[command(subcommand)]
    Style(StyleCommands),

    /// Generate a reply to an incoming message.
    #[command(subcommand)]
    Reply(ReplyCommands),

    /// Show database statistics.
    Stats,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum EmbedCommands {
    /// Embed samples that are missing embeddings.
    Pending {
        /// Only embed samples belonging to this user.
        #[arg(long)]
        user: Option<String>,

        /// Maximum number of samples to process.
        #[arg(long)]
        limit: Option<i64>,

        /// Report what would be embedded without calling the provider.
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete all embeddings and regenerate them.
    Rebuild,
}

#[derive(Subcommand)]
enum PartnerCommands {
    /// Add a partner.
    Add {
        /// Display name.
        name: String,

        /// Explicit id (a UUID is generated otherwise).
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum StyleCommands {
    /// Set custom guidelines that override the default constraints.
    Set {
        /// User id.
        user: String,

        /// Guideline text, rendered verbatim into the prompt.
        guidelines: String,
    },

    /// Show the current guidelines.
    Show {
        /// User id.
        user: String,
    },

    /// Clear the guidelines, restoring default constraints.
    Clear {
        /// User id.
        user: String,
    },
}

#[derive(Subcommand)]
enum ReplyCommands {
    /// Generate one reply.
    Single {
        /// Incoming message to reply to.
        message: String,

        /// User whose style to imitate.
        #[arg(long)]
        user: String,

        /// Partner the message came from.
        #[arg(long)]
        partner: String,

        /// Emit JSON including the context bundle.
        #[arg(long)]
        json: bool,
    },

    /// Generate an agreeing and a declining reply.
    Dual {
        /// Incoming message to reply to.
        message: String,

        /// User whose style to imitate.
        #[arg(long)]
        user: String,

        /// Partner the message came from.
        #[arg(long)]
        partner: String,

        /// Emit JSON including the context bundle.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "tone", &mut std::io::stdout());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&config).await?;
            println!("database initialized at {}", config.db.path.display());
        }
        Commands::Import {
            file,
            user,
            user_name,
        } => {
            import::run_import(&config, &file, &user, user_name.as_deref()).await?;
        }
        Commands::Embed(EmbedCommands::Pending {
            user,
            limit,
            dry_run,
        }) => {
            embed_cmd::run_embed_pending(&config, user.as_deref(), limit, dry_run).await?;
        }
        Commands::Embed(EmbedCommands::Rebuild) => {
            embed_cmd::run_embed_rebuild(&config).await?;
        }
        Commands::Partner {
            command: PartnerCommands::Add { name, id },
        } => {
            partner_cmd::run_partner_add(&config, &name, id.as_deref()).await?;
        }
        Commands::Relate {
            user,
            partner,
            category,
            politeness,
            vibe,
        } => {
            partner_cmd::run_relate(
                &config,
                &user,
                &partner,
                &category,
                politeness.as_deref(),
                vibe.as_deref(),
            )
            .await?;
        }
        Commands::Style(StyleCommands::Set { user, guidelines }) => {
            style_cmd::run_style_set(&config, &user, &guidelines).await?;
        }
        Commands::Style(StyleCommands::Show { user }) => {
            style_cmd::run_style_show(&config, &user).await?;
        }
        Commands::Style(StyleCommands::Clear { user }) => {
            style_cmd::run_style_clear(&config, &user).await?;
        }
        Commands::Reply(ReplyCommands::Single {
            message,
            user,
            partner,
            json,
        }) => {
            reply_cmd::run_reply_single(&config, &user, &partner, &message, json).await?;
        }
        Commands::Reply(ReplyCommands::Dual {
            message,
            user,
            partner,
            json,
        }) => {
            reply_cmd::run_reply_dual(&config, &user, &partner, &message, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&config).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
