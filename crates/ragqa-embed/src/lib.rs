//! Embedding layer: a dimension-checked wrapper around pluggable backends.
//!
//! [`Embedder`] is what the pipeline talks to. It accepts whole batches,
//! pins the vector dimension on its first successful call and rejects any
//! later output of a different size. Backends implement
//! [`ragqa_core::traits::EmbeddingModel`]; two ship here, a candle sentence
//! encoder and a deterministic hashing embedder.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info};

use ragqa_core::config::{expand_path, EmbeddingBackend, EmbeddingSettings};
use ragqa_core::error::Error;
use ragqa_core::traits::EmbeddingModel;

pub mod device;
pub mod hashing;
pub mod pool;
pub mod sentence;
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use sentence::SentenceModel;

const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

pub struct Embedder {
    model: Box<dyn EmbeddingModel>,
    dim: OnceLock<usize>,
}

impl Embedder {
    pub fn new(model: Box<dyn EmbeddingModel>) -> Self {
        Self { model, dim: OnceLock::new() }
    }

    pub fn model_id(&self) -> &str { self.model.model_id() }

    /// Dimension established by the first successful call, if any.
    pub fn dim(&self) -> Option<usize> { self.dim.get().copied() }

    /// Embed a batch, one vector per input, in input order.
    pub fn encode(&self, texts: &[String]) -> ragqa_core::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self
            .model
            .embed_batch(texts)
            .map_err(|e| Error::Embedding(format!("{}: {:#}", self.model.model_id(), e)))?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "{} returned {} vectors for {} inputs",
                self.model.model_id(),
                vectors.len(),
                texts.len()
            )));
        }

        let first = vectors[0].len();
        if first == 0 {
            return Err(Error::Embedding(format!("{} produced empty vectors", self.model.model_id())));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != first) {
            return Err(Error::DimensionMismatch { expected: first, actual: bad.len() });
        }
        let expected = *self.dim.get_or_init(|| {
            info!(model = self.model.model_id(), dim = first, "embedding dimension established");
            first
        });
        if first != expected {
            return Err(Error::DimensionMismatch { expected, actual: first });
        }
        debug!(texts = texts.len(), "encoded batch");
        Ok(vectors)
    }

    /// Single-text form; a one-element batch.
    pub fn encode_one(&self, text: &str) -> ragqa_core::Result<Vec<f32>> {
        let mut vectors = self.encode(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| Error::Embedding("empty embedding output".to_string()))
    }
}

/// Pick the backend described by `settings`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing backend regardless of
/// configuration, which keeps tests and dev runs away from model files.
pub fn load_model(settings: &EmbeddingSettings) -> Result<Box<dyn EmbeddingModel>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || settings.backend == EmbeddingBackend::Hashing {
        if settings.hashing_dim == 0 {
            return Err(anyhow!("embedding.hashing_dim must be positive"));
        }
        info!(dim = settings.hashing_dim, "using hashing embedder");
        return Ok(Box::new(HashingEmbedder::new(settings.hashing_dim)));
    }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(SentenceModel::load(&model_dir, settings.max_len, settings.batch_size)?))
}

pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Embedder> {
    Ok(Embedder::new(load_model(settings)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model dir {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = expand_path(&dir);
        if p.exists() { debug!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); }
    }
    let default = Path::new(DEFAULT_MODEL_DIR);
    if default.exists() { return Ok(default.to_path_buf()); }
    Err(anyhow!("Could not locate sentence model directory (set embedding.model_dir or APP_MODEL_DIR)"))
}
