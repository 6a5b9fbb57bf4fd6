//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are addressed from the environment with a double underscore,
//! e.g. `APP_CHUNKING__CHUNK_SIZE=800`. `expand_path` expands `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Build a config from an inline TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

/// Typed view over the merged configuration. Every section has defaults,
/// so an absent `config.toml` still yields a runnable setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub sources: SourceSettings,
    pub answer: AnswerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.to_config()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be positive".to_string()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::Config("embedding.max_len must be positive".to_string()));
        }
        if self.embedding.hashing_dim == 0 {
            return Err(Error::Config("embedding.hashing_dim must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 100 }
    }
}

impl ChunkingSettings {
    pub fn to_config(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunk_size, self.overlap)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Characters of each chunk shown by the fallback answer.
    pub max_preview: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, max_preview: 200 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Pretrained BERT sentence encoder run through candle.
    Sentence,
    /// Deterministic feature-hashing embedder, no model files needed.
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    pub hashing_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Sentence, model_dir: None, max_len: 256, batch_size: 32, hashing_dim: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub dirs: Vec<String>,
    pub jsonl: Vec<String>,
    pub extensions: Vec<String>,
    pub max_file_size: u64,
    pub name_contains: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            jsonl: Vec::new(),
            extensions: vec!["md".to_string(), "txt".to_string(), "py".to_string()],
            max_file_size: 100_000,
            name_contains: None,
        }
    }
}

/// A keyword rule declared in configuration, see `ragqa_engine::answer::KeywordRule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSettings {
    pub name: String,
    #[serde(default)]
    pub question_any: Vec<String>,
    #[serde(default)]
    pub context_all: Vec<String>,
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Keep the built-in rules ahead of the configured ones.
    pub builtin_rules: bool,
    pub rules: Vec<RuleSettings>,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self { builtin_rules: true, rules: Vec::new() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
