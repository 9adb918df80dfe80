use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Final ranked-sample count handed to the prompt compiler.
    #[serde(default = "default_final_k")]
    pub final_k: usize,
    /// Candidate pool multiplier for the MMR re-ranker.
    #[serde(default = "default_over_fetch_factor")]
    pub over_fetch_factor: i64,
    /// MMR relevance/diversity weight: 1.0 = pure relevance.
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
    /// Recent dialogue turns included in the prompt.
    #[serde(default = "default_recent_turns")]
    pub recent_turns: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            final_k: default_final_k(),
            over_fetch_factor: default_over_fetch_factor(),
            mmr_lambda: default_mmr_lambda(),
            recent_turns: default_recent_turns(),
        }
    }
}

fn default_final_k() -> usize {
    15
}
fn default_over_fetch_factor() -> i64 {
    10
}
fn default_mmr_lambda() -> f64 {
    0.9
}
fn default_recent_turns() -> i64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens_single")]
    pub max_tokens_single: u32,
    #[serde(default = "default_max_tokens_dual")]
    pub max_tokens_dual: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens_single: default_max_tokens_single(),
            max_tokens_dual: default_max_tokens_dual(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens_single() -> u32 {
    100
}
fn default_max_tokens_dual() -> u32 {
    150
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PromptConfig {
    /// Overrides the built-in default constraint block. Custom per-user
    /// guidelines still take precedence over this.
    #[serde(default)]
    pub default_constraints: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    if config.retrieval.final_k == 0 {
        anyhow::bail!("retrieval.final_k must be >= 1");
    }
    if config.retrieval.over_fetch_factor < 1 {
        anyhow::bail!("retrieval.over_fetch_factor must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.mmr_lambda) {
        anyhow::bail!("retrieval.mmr_lambda must be in [0.0, 1.0]");
    }
    if config.retrieval.recent_turns < 0 {
        anyhow::bail!("retrieval.recent_turns must be >= 0");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    if config.generation.is_enabled() && !(0.0..=2.0).contains(&config.generation.temperature) {
        anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config("[db]\npath = \"/tmp/tone.sqlite\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.retrieval.final_k, 15);
        assert_eq!(config.retrieval.over_fetch_factor, 10);
        assert!((config.retrieval.mmr_lambda - 0.9).abs() < 1e-9);
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.max_tokens_dual, 150);
    }

    #[test]
    fn test_lambda_out_of_range_rejected() {
        let file = write_config(
            "[db]\npath = \"/tmp/tone.sqlite\"\n[retrieval]\nmmr_lambda = 1.5\n",
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_openai_embedding_requires_model_and_dims() {
        let file = write_config(
            "[db]\npath = \"/tmp/tone.sqlite\"\n[embedding]\nprovider = \"openai\"\n",
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("dims"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let file = write_config(
            "[db]\npath = \"/tmp/tone.sqlite\"\n[generation]\nprovider = \"cohere\"\n",
        );
        assert!(load_config(file.path()).is_err());
    }
}
