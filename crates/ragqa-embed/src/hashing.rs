use anyhow::{ensure, Result};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use ragqa_core::traits::EmbeddingModel;

/// Feature-hashing bag-of-words embedder.
///
/// Lower-cased alphanumeric tokens are hashed into `dim` buckets and the
/// counts are L2-normalised. Texts sharing more words land closer together,
/// which is enough for offline runs and tests without model files.
pub struct HashingEmbedder {
    dim: usize,
    id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hashing:d{dim}") }
    }

    pub fn dim(&self) -> usize { self.dim }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn model_id(&self) -> &str { &self.id }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        ensure!(self.dim > 0, "hashing embedder needs a positive dimension");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
