use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ragqa_core::config::{expand_path, Config, EmbeddingBackend, Settings};
use ragqa_core::source::{DirectorySource, JsonlSource};
use ragqa_core::traits::DocumentSource;
use ragqa_core::types::RetrievedChunk;
use ragqa_embed::load_embedder;
use ragqa_engine::{AnswerSynthesizer, QueryEngine, QueryEngineConfig};

#[derive(Parser)]
#[command(name = "ragqa", about = "Ask questions about your documents and repositories")]
struct Cli {
    /// Directory to ingest (repeatable); adds to `sources.dirs`
    #[arg(long = "dir", global = true)]
    dirs: Vec<PathBuf>,

    /// JSON-lines export to ingest (repeatable); adds to `sources.jsonl`
    #[arg(long = "jsonl", global = true)]
    jsonl: Vec<PathBuf>,

    /// Use the hashing embedder instead of the sentence model
    #[arg(long, global = true)]
    fake_embeddings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and report counts
    Ingest,
    /// Answer a single question
    Ask {
        question: String,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Also print the retrieved chunks
        #[arg(long)]
        sources: bool,
    },
    /// Interactive loop; type `exit` to quit
    Chat,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let mut settings = config.settings()?;
    if cli.fake_embeddings {
        settings.embedding.backend = EmbeddingBackend::Hashing;
    }

    let engine = build_engine(&settings, &cli)?;

    match cli.command {
        Commands::Ingest => {
            println!("✅ Index ready ({} chunks, {} vectors)", engine.chunks().len(), engine.index_total());
        }
        Commands::Ask { question, top_k, sources } => {
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let answer = engine.answer(&question, top_k)?;
            println!("{}", answer.text);
            if sources {
                print_sources(&answer.sources);
            }
        }
        Commands::Chat => chat_loop(&engine)?,
    }
    Ok(())
}

fn build_engine(settings: &Settings, cli: &Cli) -> anyhow::Result<QueryEngine> {
    let mut sources: Vec<Box<dyn DocumentSource>> = Vec::new();
    let dirs = settings.sources.dirs.iter().map(expand_path).chain(cli.dirs.iter().cloned());
    for dir in dirs {
        sources.push(Box::new(DirectorySource::from_settings(dir, &settings.sources)));
    }
    let files = settings.sources.jsonl.iter().map(expand_path).chain(cli.jsonl.iter().cloned());
    for file in files {
        sources.push(Box::new(JsonlSource::new(file)));
    }
    if sources.is_empty() {
        anyhow::bail!("no document sources configured; pass --dir/--jsonl or set sources.dirs in config.toml");
    }

    let embedder = load_embedder(&settings.embedding).context("loading embedder")?;
    let engine_config = QueryEngineConfig::from_settings(settings)?;
    let mut engine = QueryEngine::new(embedder, engine_config).with_synthesizer(AnswerSynthesizer::from_settings(&settings.answer));

    let report = engine.build_from_sources(&sources).context("building index")?;
    eprintln!("📚 Loaded {} documents -> {} chunks -> {} vectors (dim {})", report.documents, report.chunks, report.vectors, report.dimension);
    Ok(engine)
}

fn print_sources(hits: &[RetrievedChunk]) {
    println!("\n📎 Sources:");
    for hit in hits {
        println!(
            "  {}. [{}] {} @{}  distance={:.4}",
            hit.rank + 1,
            hit.chunk.source_tag,
            hit.chunk.doc_id,
            hit.chunk.start_offset,
            hit.distance
        );
    }
}

fn chat_loop(engine: &QueryEngine) -> anyhow::Result<()> {
    println!("💬 Ask a question (type 'exit' to quit)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("ask> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let input = line?;
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            println!("👋 Goodbye!");
            break;
        }
        println!("\n{}", engine.ask(input)?);
    }
    Ok(())
}
