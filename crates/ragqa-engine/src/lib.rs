//! Query engine: owns the chunk list, the vector index and the embedder.
//!
//! Lifecycle is two-phase. `build` runs once and freezes everything it
//! produced; `ask` can then be called any number of times, from any number
//! of threads, since nothing is mutated after the build.

use tracing::info;

use ragqa_core::chunker::{Chunker, ChunkingConfig};
use ragqa_core::config::Settings;
use ragqa_core::error::{Error, Result};
use ragqa_core::source::collect_documents;
use ragqa_core::traits::DocumentSource;
use ragqa_core::types::{BuildReport, Chunk, Document, RetrievedChunk};
use ragqa_embed::Embedder;
use ragqa_vector::VectorIndex;

pub mod answer;

pub use answer::{AnswerRule, AnswerSynthesizer, KeywordRule};

#[derive(Debug, Clone)]
pub struct QueryEngineConfig {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub max_preview: usize,
}

impl Default for QueryEngineConfig {
    fn default() -> Self {
        Self { chunking: ChunkingConfig::default(), top_k: 3, max_preview: 200 }
    }
}

impl QueryEngineConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            chunking: settings.chunking.to_config()?,
            top_k: settings.retrieval.top_k,
            max_preview: settings.retrieval.max_preview,
        })
    }
}

/// Answer text plus the ranked chunks it was composed from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
}

/// State installed by a successful build.
struct Built {
    chunks: Vec<Chunk>,
    index: VectorIndex,
}

pub struct QueryEngine {
    embedder: Embedder,
    chunker: Chunker,
    synthesizer: AnswerSynthesizer,
    config: QueryEngineConfig,
    built: Option<Built>,
}

impl QueryEngine {
    pub fn new(embedder: Embedder, config: QueryEngineConfig) -> Self {
        Self {
            embedder,
            chunker: Chunker::new(config.chunking),
            synthesizer: AnswerSynthesizer::with_builtin_rules(),
            config,
            built: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: AnswerSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn is_built(&self) -> bool { self.built.is_some() }

    /// Built chunk sequence; empty before build.
    pub fn chunks(&self) -> &[Chunk] {
        self.built.as_ref().map(|b| b.chunks.as_slice()).unwrap_or(&[])
    }

    pub fn index_total(&self) -> usize {
        self.built.as_ref().map(|b| b.index.total()).unwrap_or(0)
    }

    pub fn embedder(&self) -> &Embedder { &self.embedder }

    /// Chunk, embed (one batched call) and index every document.
    ///
    /// Runs once. Nothing is installed unless every step succeeds.
    pub fn build(&mut self, documents: Vec<Document>) -> Result<BuildReport> {
        if self.built.is_some() {
            return Err(Error::Index("engine is already built".to_string()));
        }

        let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| self.chunker.chunk_document(doc)).collect();
        if chunks.is_empty() {
            return Err(Error::Index(format!("no chunks produced from {} documents; nothing to index", documents.len())));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.encode(&texts)?;
        let index = VectorIndex::build(&vectors)?;

        let report = BuildReport {
            documents: documents.len(),
            chunks: chunks.len(),
            vectors: index.total(),
            dimension: index.dim().unwrap_or(0),
        };
        if report.chunks != report.vectors {
            return Err(Error::Index(format!("{} chunks but {} vectors", report.chunks, report.vectors)));
        }
        info!(documents = report.documents, chunks = report.chunks, vectors = report.vectors, dim = report.dimension, "index built");

        self.built = Some(Built { chunks, index });
        Ok(report)
    }

    /// Concatenate every source's documents, then [`QueryEngine::build`].
    pub fn build_from_sources(&mut self, sources: &[Box<dyn DocumentSource>]) -> Result<BuildReport> {
        let documents = collect_documents(sources)?;
        self.build(documents)
    }

    /// Ranked chunks for `question`, nearest first.
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let built = self.built.as_ref().ok_or_else(|| Error::Query("ask called before the index was built".to_string()))?;
        if top_k == 0 {
            return Err(Error::Query("top_k must be positive".to_string()));
        }
        if question.trim().is_empty() {
            return Err(Error::Query("question is empty".to_string()));
        }

        let query = self.embedder.encode_one(question)?;
        let hits = built.index.search(&query, top_k)?;
        hits.into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                let chunk = built
                    .chunks
                    .get(hit.position)
                    .ok_or_else(|| Error::Index(format!("hit position {} outside chunk list", hit.position)))?;
                Ok(RetrievedChunk { rank, distance: hit.distance, chunk: chunk.clone() })
            })
            .collect()
    }

    pub fn ask(&self, question: &str) -> Result<String> {
        self.ask_with_top_k(question, self.config.top_k)
    }

    pub fn ask_with_top_k(&self, question: &str, top_k: usize) -> Result<String> {
        Ok(self.answer(question, top_k)?.text)
    }

    /// Like [`QueryEngine::ask_with_top_k`], keeping the retrieved chunks.
    /// The question is embedded once.
    pub fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        let sources = self.retrieve(question, top_k)?;
        let texts: Vec<&str> = sources.iter().map(|r| r.chunk.text.as_str()).collect();
        let text = self.synthesizer.synthesize(question, &texts, self.config.max_preview);
        Ok(Answer { text, sources })
    }
}
