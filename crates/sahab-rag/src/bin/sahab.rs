//! SAHAB command line
//!
//! Run with: cargo run -p sahab-rag --features cli --bin sahab -- <command>

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sahab_rag::{
    providers::embedder_from_config,
    retrieval::{build_from_corpus, VectorIndex},
    ChatRequest, ConversationMemory, RagConfig, RagService,
};

#[derive(Parser)]
#[command(name = "sahab", version, about = "Legal question answering over statute text")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the statute index (or report on the existing one)
    Index {
        /// Rebuild even if an index already exists
        #[arg(long)]
        rebuild: bool,
    },
    /// Ask one question and stream the answer
    Ask {
        /// The legal question
        question: String,
        /// Output language
        #[arg(short, long, default_value = "English")]
        language: String,
        /// Answer only from the statutes, never from general knowledge
        #[arg(long)]
        closed_book: bool,
    },
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

async fn index(config: &RagConfig, rebuild: bool) -> anyhow::Result<()> {
    let embedder = embedder_from_config(&config.embeddings)?;

    if config.index.path.exists() && !rebuild {
        let index = VectorIndex::load(&config.index.path, embedder.as_ref())?;
        let manifest = index.manifest();
        println!(
            "{} {} chunks, {} dimensions, built {} by {}",
            style("Index ready:").green().bold(),
            manifest.chunk_count,
            manifest.dimensions,
            manifest.created_at.format("%Y-%m-%d %H:%M"),
            manifest.embedder
        );
        return Ok(());
    }

    let pb = spinner(&format!("Embedding {}", config.corpus.path.display()))?;
    let index = build_from_corpus(config, embedder.as_ref()).await?;
    pb.set_message("Saving index");
    index.save(&config.index.path)?;
    pb.finish_and_clear();

    println!(
        "{} {} chunks written to {}",
        style("Index built:").green().bold(),
        index.len(),
        config.index.path.display()
    );
    Ok(())
}

async fn ask(config: &RagConfig, question: String, language: String) -> anyhow::Result<()> {
    let pb = spinner("Loading statute index")?;
    let service = RagService::from_config(config)
        .await
        .context("failed to initialize the pipeline")?;
    pb.finish_and_clear();

    let request = ChatRequest::new(question).with_language(language);
    let memory = Arc::new(Mutex::new(ConversationMemory::new()));
    let chat = service.answer_stream(&request, memory).await;

    if !chat.sources.is_empty() {
        println!("{} {}\n", style("Sources:").dim(), chat.sources.join(", "));
    }

    let mut fragments = chat.fragments;
    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.next().await {
        write!(stdout, "{}", fragment)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sahab_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Index { rebuild } => index(&config, rebuild).await,
        Command::Ask {
            question,
            language,
            closed_book,
        } => {
            config.retrieval.closed_book |= closed_book;
            ask(&config, question, language).await
        }
    }
}
