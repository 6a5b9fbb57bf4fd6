//! Domain types shared by the chunker, embedder, index and query engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A decoded source file or page, as handed over by a document source.
///
/// - `source_tag`: which adapter produced it (e.g. "drive", "github", "local")
/// - `id`: stable identity within that source (file id or relative path)
/// - `text`: UTF-8 payload, already decoded by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    source_tag: String,
    id: String,
    text: String,
}

impl Document {
    pub fn new(source_tag: impl Into<String>, id: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let source_tag = source_tag.into();
        let id = id.into();
        if source_tag.trim().is_empty() {
            return Err(Error::InvalidDocument(format!("document '{id}' has an empty source tag")));
        }
        if id.trim().is_empty() {
            return Err(Error::InvalidDocument(format!("document from '{source_tag}' has an empty id")));
        }
        Ok(Self { source_tag, id, text: text.into() })
    }

    pub fn source_tag(&self) -> &str { &self.source_tag }
    pub fn id(&self) -> &str { &self.id }
    pub fn text(&self) -> &str { &self.text }
}

/// Loosely-typed record as found in exported corpora (JSON lines, API dumps).
///
/// Converted into a [`Document`] with `TryFrom`, which is where missing or
/// blank fields get rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub source_tag: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TryFrom<DocumentRecord> for Document {
    type Error = Error;

    fn try_from(record: DocumentRecord) -> Result<Self> {
        let id = record.id.ok_or_else(|| Error::InvalidDocument("record is missing 'id'".to_string()))?;
        let source_tag = record
            .source_tag
            .ok_or_else(|| Error::InvalidDocument(format!("record '{id}' is missing 'source_tag'")))?;
        let text = record
            .text
            .ok_or_else(|| Error::InvalidDocument(format!("record '{id}' is missing 'text'")))?;
        Document::new(source_tag, id, text)
    }
}

/// A window of a document's text, the atomic unit that gets embedded and retrieved.
///
/// `start_offset` counts characters, not bytes. `chunk_index` is the
/// ordinal of the window inside its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_tag: String,
    pub doc_id: String,
    pub chunk_index: usize,
    pub start_offset: usize,
    pub text: String,
}

/// One nearest-neighbour result. `position` indexes the global chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
}

/// A search hit joined back to the chunk it points at.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub rank: usize,
    pub distance: f32,
    pub chunk: Chunk,
}

/// Counts reported once the build phase finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub vectors: usize,
    pub dimension: usize,
}
