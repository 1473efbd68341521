use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taxrag_core::config::{Config, Settings};
use taxrag_core::traits::{CorpusLoader, Embedder};
use taxrag_embed::get_default_embedder;
use taxrag_engine::{suggest_followups, Corpus, RagEngine};
use taxrag_vector::{loader_for, Catalog};

/// Ask questions about a tax document corpus.
#[derive(Parser, Debug)]
#[command(name = "taxrag", version, about)]
struct Cli {
    /// Directory holding config.toml; relative storage paths resolve against it
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Document id to serve (defaults to storage.default_document)
    #[arg(short, long)]
    document: Option<String>,

    /// Number of chunks to retrieve (defaults to retrieval.top_k)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question
    Ask {
        query: String,
        /// Ignore conversation history
        #[arg(long)]
        no_context: bool,
        /// Print the full answer envelope as JSON
        #[arg(long)]
        json: bool,
        /// Also print follow-up question suggestions
        #[arg(long)]
        suggest: bool,
    },
    /// Show the ranked chunks retrieval returns for a query
    Chunks { query: String },
    /// Interactive session (`quit` to leave)
    Chat,
    /// List documents with a vector store
    Documents,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

struct App {
    catalog: Catalog,
    loader: Box<dyn CorpusLoader>,
    settings: Settings,
}

impl App {
    fn open_engine(&self, document: &str) -> anyhow::Result<RagEngine> {
        let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&self.settings.embedding)?);
        let engine = RagEngine::open(self.settings.clone(), &self.catalog, self.loader.as_ref(), embedder, document)?;
        tracing::info!(document = %engine.document_id(), loader = self.loader.name(), "engine ready");
        Ok(engine)
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let app = App {
        catalog: Catalog::from_settings(&cli.config_dir, &settings.storage),
        loader: loader_for(&settings.storage),
        settings,
    };
    let document = cli.document.clone().unwrap_or_else(|| app.settings.storage.default_document.clone());
    let top_k = cli.top_k.unwrap_or(app.settings.retrieval.top_k);

    match cli.command {
        Command::Documents => {
            let docs = app.catalog.documents()?;
            if docs.is_empty() {
                println!("No document stores under {}", app.catalog.vector_root().display());
            }
            for doc in docs {
                println!("{doc}");
            }
        }
        Command::Ask { query, no_context, json, suggest } => {
            let mut engine = app.open_engine(&document)?;
            let answer = engine.ask(&query, top_k, !no_context);
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.text);
            }
            if suggest {
                println!("\nYou could also ask:");
                for s in suggest_followups(&query) {
                    println!("  • {s}");
                }
            }
        }
        Command::Chunks { query } => {
            let mut engine = app.open_engine(&document)?;
            let results = engine.find_relevant_chunks(&query, top_k);
            println!("🔍 {} chunks for \"{}\" in {}", results.len(), query, engine.document_id());
            for (i, r) in results.iter().enumerate() {
                println!(
                    "\n  {}. score={:.4}  similarity={:.4}  boost={:.2}  id={}  page={}  section={}",
                    i + 1,
                    r.score,
                    r.base_similarity,
                    r.keyword_boost,
                    r.chunk_id(),
                    r.chunk.page,
                    r.chunk.section
                );
                println!("     {}", r.text());
            }
        }
        Command::Chat => chat(&app, app.open_engine(&document)?, top_k)?,
    }
    Ok(())
}

fn chat(app: &App, mut engine: RagEngine, top_k: usize) -> anyhow::Result<()> {
    println!("💬 Tax assistant on '{}'. Type 'quit' to leave, ':help' for commands.", engine.document_id());
    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        print!("\n❓ ");
        out.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" | "bye" | "q" => break,
            ":help" => println!(":clear  :summary  :stats  :switch <doc>  quit"),
            ":clear" => {
                engine.clear_history();
                println!("🧹 history and cache cleared");
            }
            ":summary" => println!("{}", serde_json::to_string_pretty(&engine.conversation_summary())?),
            ":stats" => println!("{}", serde_json::to_string_pretty(&engine.stats())?),
            _ if line.starts_with(":switch") => {
                let doc = line.trim_start_matches(":switch").trim();
                if doc.is_empty() {
                    println!("usage: :switch <document>");
                    continue;
                }
                match Corpus::open(&app.catalog, app.loader.as_ref(), doc) {
                    Ok(corpus) => {
                        engine.switch_document(corpus);
                        println!("📖 now serving '{}'", engine.document_id());
                    }
                    Err(e) => println!("❌ {e}"),
                }
            }
            query => {
                let answer = engine.ask(query, top_k, true);
                println!("\n{}", answer.text);
            }
        }
    }
    println!("👋 Goodbye!");
    Ok(())
}
