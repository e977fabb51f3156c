//! HTTP server for the SAHAB assistant

pub mod routes;
pub mod state;

use axum::{http::StatusCode, routing::get, Json, Router};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::RagService;
use state::AppState;

/// SAHAB HTTP server
///
/// Starts accepting requests immediately; chat endpoints answer with the
/// initializing notice until the index has been loaded in the background.
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server whose pipeline is initialized by `start`
    pub fn new(config: RagConfig) -> Self {
        let state = AppState::new(config.clone());
        Self { config, state }
    }

    /// Create a server around existing state
    pub fn with_state(config: RagConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Shared state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(welcome))
            // Health check
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .nest("/api/v1", routes::api_routes())
            .with_state(self.state.clone())
            // Middleware layers (order matters - applied bottom to top)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server and initialize the pipeline in the background
    ///
    /// Returns the initialization error if the index cannot be built or
    /// loaded; otherwise runs until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::config(format!("Failed to bind: {}", e)))?;

        tracing::info!("Starting SAHAB server on http://{}", addr);

        let (failure_tx, failure_rx) = oneshot::channel();
        let state = self.state.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            tracing::info!("Initializing statute index...");
            match RagService::from_config(&config).await {
                Ok(service) => {
                    state.set_service(Arc::new(service));
                    tracing::info!("SAHAB is ready");
                }
                Err(e) => {
                    tracing::error!("Initialization failed: {}", e);
                    let _ = failure_tx.send(e);
                }
            }
        });

        let init_error = Arc::new(Mutex::new(None));
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(failure_rx, Arc::clone(&init_error)))
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        let failure = init_error.lock().take();
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Resolves on Ctrl-C, or as soon as initialization fails
async fn shutdown_signal(
    init_failure: oneshot::Receiver<Error>,
    slot: Arc<Mutex<Option<Error>>>,
) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(ctrl_c);

    tokio::select! {
        failure = init_failure => match failure {
            Ok(e) => {
                *slot.lock() = Some(e);
            }
            // Initialization succeeded; keep serving
            Err(_) => ctrl_c.await,
        },
        _ = &mut ctrl_c => {}
    }

    tracing::info!("Shutting down");
}

/// Welcome endpoint
async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to SAHAB API" }))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
