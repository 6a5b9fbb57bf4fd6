use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ragqa_core::chunker::{chunk_text, ChunkingConfig};
use ragqa_core::config::Config;
use ragqa_core::source::{DirectorySource, StaticSource};
use ragqa_core::traits::{DocumentSource, EmbeddingModel};
use ragqa_core::types::Document;
use ragqa_core::Error;
use ragqa_embed::{Embedder, HashingEmbedder};
use ragqa_engine::answer::{FALLBACK_BANNER, RESUME_ANALYZER_ANSWER};
use ragqa_engine::{QueryEngine, QueryEngineConfig};

const VIOLENCE: &str = "Violence detection using deep learning models like CNN and LSTM.";
const CCTV: &str = "CCTV surveillance systems help improve public safety.";
const FOOD: &str = "Food delivery applications focus on logistics and user experience. ";

fn hashing_engine() -> QueryEngine {
    QueryEngine::new(Embedder::new(Box::new(HashingEmbedder::new(384))), QueryEngineConfig::default())
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("drive", "violence.txt", VIOLENCE).unwrap(),
        Document::new("github", "cctv/README.md", CCTV).unwrap(),
        Document::new("github", "food/notes.md", FOOD.repeat(20)).unwrap(),
    ]
}

struct CountingModel {
    calls: Arc<AtomicUsize>,
    inner: HashingEmbedder,
}

impl EmbeddingModel for CountingModel {
    fn model_id(&self) -> &str { "counting" }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

/// Emits one vector per text, but the last one is one element short.
struct RaggedModel;

impl EmbeddingModel for RaggedModel {
    fn model_id(&self) -> &str { "ragged" }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().enumerate().map(|(i, _)| vec![1.0; if i + 1 == texts.len() { 3 } else { 4 }]).collect())
    }
}

#[test]
fn ask_before_build_is_a_query_error() {
    let engine = hashing_engine();
    assert!(!engine.is_built());
    assert!(matches!(engine.ask("anything"), Err(Error::Query(_))));
    assert!(matches!(engine.retrieve("anything", 3), Err(Error::Query(_))));
}

#[test]
fn end_to_end_counts_and_ranking() {
    let docs = corpus();
    let expected: usize = docs.iter().map(|d| chunk_text(d.text(), 500, 100).unwrap().len()).sum();
    assert!(expected > 3, "the long document spans several chunks");

    let mut engine = hashing_engine();
    let report = engine.build(docs).expect("build");
    assert_eq!(report.documents, 3);
    assert_eq!(report.chunks, expected);
    assert_eq!(report.vectors, expected);
    assert_eq!(report.dimension, 384);
    assert_eq!(engine.index_total(), expected);
    assert_eq!(engine.chunks().len(), expected);

    let hits = engine.retrieve("violence detection CCTV", 3).expect("retrieve");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.doc_id, "violence.txt");
    assert!(hits[0].chunk.text.starts_with("Violence detection using deep learning"));
    assert_eq!(hits[1].chunk.doc_id, "cctv/README.md");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(hits.iter().enumerate().all(|(i, h)| h.rank == i));
}

#[test]
fn chunks_keep_document_order_and_attribution() {
    let mut engine = hashing_engine();
    engine.build(corpus()).expect("build");
    let chunks = engine.chunks();
    assert_eq!(chunks[0].source_tag, "drive");
    assert_eq!(chunks[1].source_tag, "github");
    assert!(chunks[2..].iter().enumerate().all(|(i, c)| c.doc_id == "food/notes.md" && c.chunk_index == i));
    assert_eq!(chunks[3].start_offset, 400);
}

#[test]
fn build_embeds_all_chunks_in_one_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = CountingModel { calls: Arc::clone(&calls), inner: HashingEmbedder::new(64) };
    let mut engine = QueryEngine::new(Embedder::new(Box::new(model)), QueryEngineConfig::default());
    engine.build(corpus()).expect("build");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    engine.ask("food delivery").expect("ask");
    assert_eq!(calls.load(Ordering::SeqCst), 2, "one call per question");

    let answer = engine.answer("violence detection CCTV", 2).expect("answer");
    assert_eq!(calls.load(Ordering::SeqCst), 3, "answer with sources embeds the question once");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.text, engine.ask_with_top_k("violence detection CCTV", 2).expect("ask"));
}

#[test]
fn resume_question_end_to_end() {
    let docs = vec![
        Document::new("github", "resume-analyzer/README.md", "Resume Analyzer: a Flask web app that scores resumes against job descriptions.").unwrap(),
        Document::new("drive", "project_violence.txt", VIOLENCE).unwrap(),
        Document::new("drive", "project_cctv.txt", CCTV).unwrap(),
    ];
    let mut engine = hashing_engine();
    engine.build(docs).expect("build");
    assert_eq!(engine.ask("What does the Resume Analyzer project do?").expect("ask"), RESUME_ANALYZER_ANSWER);

    let answer = engine.ask_with_top_k("How do surveillance systems improve safety?", 1).expect("ask");
    assert_eq!(answer, format!("{FALLBACK_BANNER}- {CCTV}...\n"));
}

#[test]
fn invalid_queries_are_rejected() {
    let mut engine = hashing_engine();
    engine.build(corpus()).expect("build");
    assert!(matches!(engine.ask_with_top_k("violence", 0), Err(Error::Query(_))));
    assert!(matches!(engine.ask("   "), Err(Error::Query(_))));
    // k larger than the corpus returns everything
    assert_eq!(engine.retrieve("violence", 100).expect("retrieve").len(), engine.index_total());
}

#[test]
fn empty_corpus_fails_and_leaves_engine_unbuilt() {
    let mut engine = hashing_engine();
    assert!(matches!(engine.build(Vec::new()), Err(Error::Index(_))));
    let blank = vec![Document::new("drive", "empty.txt", "").unwrap()];
    assert!(matches!(engine.build(blank), Err(Error::Index(_))));
    assert!(!engine.is_built());
    assert!(matches!(engine.ask("anything"), Err(Error::Query(_))));
}

#[test]
fn second_build_is_rejected() {
    let mut engine = hashing_engine();
    engine.build(corpus()).expect("build");
    let before = engine.index_total();
    assert!(matches!(engine.build(corpus()), Err(Error::Index(_))));
    assert_eq!(engine.index_total(), before);
}

#[test]
fn embedding_errors_abort_the_build() {
    let mut engine = QueryEngine::new(Embedder::new(Box::new(RaggedModel)), QueryEngineConfig::default());
    let err = engine.build(corpus()).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3 }), "{err:?}");
    assert!(!engine.is_built());
}

#[test]
fn build_from_sources_concatenates_adapters() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("project_notes.txt"), VIOLENCE).unwrap();

    let sources: Vec<Box<dyn DocumentSource>> = vec![
        Box::new(DirectorySource::new(tmp.path()).with_tag("drive")),
        Box::new(StaticSource::new("github", vec![Document::new("github", "repo/a.py", CCTV).unwrap()])),
    ];
    let mut engine = hashing_engine();
    let report = engine.build_from_sources(&sources).expect("build");
    assert_eq!(report.documents, 2);
    assert_eq!(engine.chunks()[0].source_tag, "drive");
    assert!(engine.chunks()[0].text.starts_with("File: project_notes.txt\n"));
    assert_eq!(engine.chunks()[1].doc_id, "repo/a.py");
}

#[test]
fn config_drives_the_engine() {
    let config = Config::from_toml_str("[chunking]\nchunk_size = 40\noverlap = 10\n[retrieval]\ntop_k = 1\nmax_preview = 12\n").unwrap();
    let settings = config.settings().unwrap();
    let engine_config = QueryEngineConfig::from_settings(&settings).unwrap();
    assert_eq!(engine_config.chunking, ChunkingConfig::new(40, 10).unwrap());

    let mut engine = QueryEngine::new(Embedder::new(Box::new(HashingEmbedder::new(128))), engine_config);
    engine.build(vec![Document::new("drive", "cctv.txt", CCTV).unwrap()]).unwrap();
    assert_eq!(engine.index_total(), 2);
    let answer = engine.ask("public safety").unwrap();
    // best window is the tail " improve public safety."
    assert_eq!(answer, format!("{FALLBACK_BANNER}-  improve pub...\n"));
}

#[test]
fn built_engine_is_shared_across_threads() {
    let mut engine = hashing_engine();
    engine.build(corpus()).expect("build");
    let engine = &engine;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || engine.retrieve("violence detection CCTV", 1).expect("retrieve")[0].chunk.doc_id.clone()))
            .collect();
        for h in handles {
            assert_eq!(h.join().expect("thread"), "violence.txt");
        }
    });
}
