//! Pagewise CLI - index documents and ask questions about them
//!
//! # Commands
//!
//! ```bash
//! # Preview how a document would be chunked
//! pagewise chunk --strategy auto report.pdf
//!
//! # Embed text and show vector stats
//! pagewise embed "What was the operating margin?"
//!
//! # Index a PDF (or every PDF in a directory)
//! pagewise ingest report.pdf --doc-id annual-report
//!
//! # Ask, optionally restricted to some documents
//! pagewise ask "What was the operating margin?" -k 5 --doc annual-report
//!
//! # Index one file and keep asking until "exit"
//! pagewise chat report.pdf
//! ```
//!
//! Settings come from `pagewise.toml` when present (see `--config`), the API
//! key from `OPENAI_API_KEY` (a `.env` file is honoured).

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagewise_lib::{
    answer::{Answer, OpenAiModel, Synthesizer},
    chunk::{Chunk, Chunker, Document, FixedSizeChunker, ParagraphChunker, Segmenter},
    config::{ChunkConfig, Config},
    embed::{Embedder, FastEmbedder},
    extract::{self, ExtractedFile},
    pipeline::Pipeline,
    retrieve::Retriever,
    store::{DocFilter, MemoryStore, VectorStore},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "pagewise.toml";

#[derive(Parser)]
#[command(name = "pagewise")]
#[command(about = "Ask questions about your documents")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./pagewise.toml if it exists)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a document and show the result without storing it
    Chunk {
        /// Input file (.pdf, .txt, .md)
        input: PathBuf,

        /// Chunking strategy: "auto", "paragraph" or "fixed"
        #[arg(short, long, default_value = "auto")]
        strategy: String,

        /// Max chunk size in characters (defaults to config)
        #[arg(long)]
        size: Option<usize>,

        /// Fallback window overlap in characters (defaults to config)
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (adds the model's query prefix, if any)
        #[arg(short, long)]
        query: bool,
    },

    /// Extract, chunk and index a file or a directory of PDFs
    Ingest {
        /// File or directory
        path: PathBuf,

        /// Document id (defaults to the file stem, single files only)
        #[arg(long)]
        doc_id: Option<String>,

        /// Display name (defaults to the file name, single files only)
        #[arg(long)]
        name: Option<String>,
    },

    /// Ask a question about the indexed documents
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve (defaults to config)
        #[arg(short, long)]
        k: Option<usize>,

        /// Only search these document ids (repeatable)
        #[arg(short, long = "doc")]
        docs: Vec<String>,
    },

    /// List indexed documents
    Docs,

    /// Remove a document from the index
    Forget {
        /// Document id
        doc_id: String,
    },

    /// Index one file, then answer questions about it until "exit"
    Chat {
        /// Input file
        input: PathBuf,

        /// Number of chunks to retrieve (defaults to config)
        #[arg(short, long)]
        k: Option<usize>,
    },
}

type AppPipeline = Pipeline<FastEmbedder, MemoryStore, OpenAiModel>;

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::from_file(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };
    Ok(config)
}

fn open_retriever(config: &Config) -> Result<Retriever<FastEmbedder, MemoryStore>> {
    println!("Loading embedding model '{}'...", config.embedding.model);
    let embedder = FastEmbedder::new(&config.embedding)?;
    let store = MemoryStore::open(&config.store.path)?;

    Ok(Retriever::new(embedder, store).with_overfetch_factor(config.retrieval.overfetch_factor))
}

fn open_pipeline(config: &Config) -> Result<AppPipeline> {
    let synthesizer = Synthesizer::new(OpenAiModel::new(&config.llm)?);
    let retriever = open_retriever(config)?;
    Ok(Pipeline::new(retriever, synthesizer, config)?)
}

fn document_for(path: &Path, doc_id: Option<String>, name: Option<String>) -> Result<Document> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    Ok(Document::new(doc_id.unwrap_or(stem), name.unwrap_or(file_name)))
}

fn chunker_for(strategy: &str, config: ChunkConfig) -> Result<Box<dyn Chunker>> {
    let chunker: Box<dyn Chunker> = match strategy {
        "auto" => Box::new(Segmenter::new(config)?),
        "paragraph" => Box::new(ParagraphChunker {
            max_size: config.max_chunk_size,
            overlap_words: config.overlap_word_count,
        }),
        "fixed" => Box::new(FixedSizeChunker {
            chunk_size: config.max_chunk_size,
            overlap: config.overlap_size,
        }),
        other => bail!("unknown strategy '{other}', expected auto, paragraph or fixed"),
    };
    Ok(chunker)
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}

fn print_chunks(source: &str, chunks: &[Chunk], strategy: &str) {
    println!("Chunked '{source}' into {} chunks using {strategy} strategy:\n", chunks.len());
    for chunk in chunks {
        println!("--- {} ({} chars) ---", chunk.id, chunk.text.chars().count());
        println!("{}\n", preview(&chunk.text, 200));
    }
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.answer);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            println!("  - {} ({})", source.doc_name, source.doc_id);
        }
    }
}

fn ingest_files(
    segmenter: &Segmenter,
    retriever: &mut Retriever<FastEmbedder, MemoryStore>,
    files: &[(Document, String)],
) -> Result<usize> {
    let mut total = 0;
    for (doc, text) in files {
        let chunks = segmenter.segment(text, doc);
        if chunks.is_empty() {
            warn!(doc_id = %doc.id, "no text to index");
        }
        let stored = retriever.replace_document(doc, &chunks)?;
        println!("Indexed '{}' as '{}': {stored} chunks", doc.name, doc.id);
        total += stored;
    }
    Ok(total)
}

async fn chat(pipeline: &mut AppPipeline, doc: &Document, k: Option<usize>) -> Result<()> {
    let filter: DocFilter = [doc.id.as_str()].into_iter().collect();
    let stdin = io::stdin();
    let mut line = String::new();

    println!("\nAsk about '{}' (type 'exit' to quit)", doc.name);
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match pipeline.ask(question, k, Some(&filter)).await {
            Ok(answer) => print_answer(&answer),
            Err(err) => eprintln!("[{}] {err}", err.stage()),
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chunk {
            input,
            strategy,
            size,
            overlap,
        } => {
            let text = extract::extract_text(&input)?;
            let chunk_config = ChunkConfig {
                max_chunk_size: size.unwrap_or(config.chunking.max_chunk_size),
                overlap_size: overlap.unwrap_or(config.chunking.overlap_size),
                ..config.chunking
            };
            chunk_config.validate()?;

            let chunker = chunker_for(&strategy, chunk_config)?;
            let doc = document_for(&input, None, None)?;
            let chunks = chunker.chunk(&text, &doc);
            print_chunks(&input.display().to_string(), &chunks, chunker.name());
        }

        Commands::Embed { text, query } => {
            println!("Loading embedding model '{}'...", config.embedding.model);
            let mut embedder = FastEmbedder::new(&config.embedding)?;

            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .context("model returned no embedding")?
            };

            println!("\nEmbedding stats ({}):", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().cloned().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().cloned().fold(f32::NEG_INFINITY, f32::max));
        }

        Commands::Ingest { path, doc_id, name } => {
            let files = if path.is_dir() {
                if doc_id.is_some() || name.is_some() {
                    bail!("--doc-id and --name only apply when ingesting a single file");
                }
                let extracted = extract::extract_directory(&path)?;
                if extracted.is_empty() {
                    bail!("no PDF files found in {}", path.display());
                }
                extracted
                    .into_iter()
                    .map(|ExtractedFile { name, text }| {
                        Ok((document_for(&path.join(&name), None, None)?, text))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let text = extract::extract_text(&path)?;
                vec![(document_for(&path, doc_id, name)?, text)]
            };

            let segmenter = Segmenter::new(config.chunking)?;
            let mut retriever = open_retriever(&config)?;
            let total = ingest_files(&segmenter, &mut retriever, &files)?;
            retriever.store_mut().flush()?;

            info!(documents = files.len(), chunks = total, "ingestion finished");
            println!("\nDone! Index contains {} chunks", retriever.len());
        }

        Commands::Ask { question, k, docs } => {
            let filter: Option<DocFilter> = (!docs.is_empty()).then(|| docs.into_iter().collect());
            let mut pipeline = open_pipeline(&config)?;
            if pipeline.retriever().is_empty() {
                warn!(path = %config.store.path.display(), "index is empty, run `pagewise ingest` first");
            }

            let answer = pipeline.ask(&question, k, filter.as_ref()).await?;
            print_answer(&answer);
            pipeline.close()?;
        }

        Commands::Docs => {
            let store = MemoryStore::open(&config.store.path)?;
            let docs = store.documents();
            if docs.is_empty() {
                println!("No documents indexed in {}", config.store.path.display());
            }
            for summary in docs {
                println!(
                    "{:<24} {:<32} {} chunks",
                    summary.document.id, summary.document.name, summary.chunk_count
                );
            }
        }

        Commands::Forget { doc_id } => {
            let mut store = MemoryStore::open(&config.store.path)?;
            let removed = store.delete_document(&doc_id)?;
            store.flush()?;

            if removed == 0 {
                println!("No document with id '{doc_id}'");
            } else {
                println!("Removed '{doc_id}' ({removed} chunks)");
            }
        }

        Commands::Chat { input, k } => {
            let text = extract::extract_text(&input)?;
            let doc = document_for(&input, None, None)?;

            let mut pipeline = open_pipeline(&config)?;
            let stored = pipeline.ingest(&text, &doc)?;
            println!("Indexed '{}': {stored} chunks", doc.name);

            chat(&mut pipeline, &doc, k).await?;
            pipeline.close()?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so answers stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        match err.downcast_ref::<pagewise_lib::Error>() {
            Some(inner) => eprintln!("[{}] {err:#}", inner.stage()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
