use crate::config::Config;
use crate::library::{FolderThumbnailRegistry, Library};
use crate::notifications::{self, LibraryNotifier};
use crate::streaming::{self, start_sweep_task, StreamingTokenStore, X_CONTENT_DURATION};
use crate::thumbnails::{ThumbnailGenerator, ThumbnailService};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mediacast_av::Prober;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod routes_admin;
pub mod routes_media;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub library: Library,
    pub tokens: StreamingTokenStore,
    pub thumbnails: ThumbnailService,
    pub prober: Arc<Prober>,
    pub folder_thumbnails: FolderThumbnailRegistry,
    /// Media server told to rescan on request, if configured.
    pub notifier: Option<Arc<dyn LibraryNotifier>>,
    /// Key signing session cookies.
    pub session_key: Arc<[u8]>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let thumbnails =
            ThumbnailService::new(ThumbnailGenerator::new(&config.thumbnails, &config.tools));
        let prober = Prober::new(config.tools.ffprobe(), config.tools.timeout());

        Self {
            library: Library::new(config.library.clone()),
            tokens: StreamingTokenStore::new(config.streaming.token_ttl_secs),
            thumbnails,
            prober: Arc::new(prober),
            folder_thumbnails: FolderThumbnailRegistry::new(config.folder_thumbnails.registry.clone()),
            notifier: notifications::from_config(&config),
            session_key: auth::session_key(&config.server.auth).into(),
            config: Arc::new(config),
        }
    }

    /// Replace the refresh notifier.
    pub fn with_notifier(mut self, notifier: Option<Arc<dyn LibraryNotifier>>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::RANGE])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
            X_CONTENT_DURATION,
        ]);

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/thumbnail/:id", get(routes_media::serve_thumbnail))
        // Checks credentials itself so streaming tokens work
        .nest("/stream", streaming::stream_router())
        .nest("/api", api_routes(&ctx))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // SPA fallback: index.html for any route that doesn't match a file
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

fn api_routes(ctx: &AppContext) -> Router<AppContext> {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/status", get(auth::auth_status));

    // The middleware also records the caller, so it runs even when
    // authentication is disabled.
    let protected_routes = routes_media::media_routes()
        .merge(streaming::token_routes())
        .merge(routes_admin::admin_routes())
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::api_auth_middleware,
        ));

    auth_routes.merge(protected_routes)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let sweep_interval = config.streaming.sweep_interval_secs;
    let ctx = AppContext::new(config);
    let sweeper = start_sweep_task(ctx.tokens.clone(), sweep_interval);

    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
