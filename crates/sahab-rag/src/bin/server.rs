//! SAHAB server binary
//!
//! Run with: cargo run -p sahab-rag --bin sahab-server [config.toml]

use sahab_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sahab_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                          SAHAB                            ║
║          Legal Assistance Grounded in Statutes            ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus: {}", config.corpus.path.display());
    tracing::info!("  - Index: {}", config.index.path.display());
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dimensions)",
        config.embeddings.backend,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/v1/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/v1/chat          - Stream an answer");
    println!("  POST   /api/v1/chat/sse      - Stream an answer as SSE");
    println!("  POST   /api/v1/chat/sync     - Full answer with sources");
    println!("  DELETE /api/v1/sessions/:id  - Clear a session");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
