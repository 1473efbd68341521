//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_CACHE__CAPACITY`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load with config files looked up under `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Wrap an explicit figment, mostly for tests and embedding hosts.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
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
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub retrieval: RetrievalSettings,
    pub cache: CacheSettings,
    pub answer: AnswerSettings,
    pub embedding: EmbeddingSettings,
}

/// On-disk layout of a persisted vector store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// LanceDB table per document.
    Native,
    /// JSON chunk list + JSON vectors per document.
    #[default]
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub vector_dir: String,
    pub metadata_dir: String,
    pub format: StorageFormat,
    pub default_document: String,
    pub table: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            vector_dir: "vector_database".to_string(),
            metadata_dir: "document_metadata".to_string(),
            format: StorageFormat::Legacy,
            default_document: "ITA_primary".to_string(),
            table: "chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub overfetch: usize,
    pub dedup_prefix_chars: usize,
    pub boost_weight: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5, similarity_threshold: 0.3, overfetch: 3, dedup_prefix_chars: 100, boost_weight: 0.2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub capacity: usize,
    pub evict_batch: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { capacity: 100, evict_batch: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub corpus_title: String,
    pub low_confidence: f32,
    pub disclaimer_below: f32,
    pub max_sources: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self { corpus_title: "Income Tax Act".to_string(), low_confidence: 0.4, disclaimer_below: 0.6, max_sources: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256 }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let r = &self.retrieval;
        if !(0.0..=1.0).contains(&r.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.similarity_threshold must be within [0, 1], got {}",
                r.similarity_threshold
            )));
        }
        if r.overfetch == 0 {
            return Err(Error::InvalidConfig("retrieval.overfetch must be at least 1".into()));
        }
        if r.boost_weight < 0.0 {
            return Err(Error::InvalidConfig("retrieval.boost_weight must not be negative".into()));
        }
        let c = &self.cache;
        if c.evict_batch == 0 || c.evict_batch > c.capacity {
            return Err(Error::InvalidConfig(format!(
                "cache.evict_batch must be in 1..={}, got {}",
                c.capacity, c.evict_batch
            )));
        }
        if self.answer.max_sources == 0 {
            return Err(Error::InvalidConfig("answer.max_sources must be at least 1".into()));
        }
        Ok(())
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

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
