use crate::types::Document;

/// A text-to-vector backend with a fixed output dimension.
///
/// Implementations must be deterministic for identical input and accept
/// whole batches; callers never embed chunk by chunk.
pub trait EmbeddingModel: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `hashing:d384`).
    fn model_id(&self) -> &str;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Anything that can hand over an ordered list of decoded documents.
pub trait DocumentSource: Send + Sync {
    fn source_tag(&self) -> &str;
    fn list_documents(&self) -> crate::error::Result<Vec<Document>>;
}
