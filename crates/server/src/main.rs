//! lostsons.tv server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use lostsons_api::{AppState, router as api_router};
use lostsons_common::{Config, S3Storage, SignatureVerifier, StorageService};
use lostsons_core::{
    ClipService, DiscordNotifier, GameService, MuxClient, UserService, VideoAssetService,
    WebhookReconciler,
};
use lostsons_db::repositories::{ClipRepository, GameRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// Requests still in flight are allowed to finish; an ingestion cut short by
/// the process exiting leaves at most an orphaned upload or asset behind.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lostsons=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting lostsons.tv server...");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Connect to database
    let db = Arc::new(lostsons_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    lostsons_db::migrate(&db).await?;
    info!("Migrations completed");

    // External collaborators
    let storage: StorageService = Arc::new(S3Storage::new(&config.storage)?);
    let assets: VideoAssetService = Arc::new(MuxClient::new(
        &config.mux,
        config.ingest.upstream_timeout(),
    )?);
    let notifier = config
        .notifications
        .discord_webhook_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(DiscordNotifier::new)
        .transpose()?;
    if notifier.is_none() {
        info!("Discord notifications disabled");
    }

    // Repositories and services
    let clip_repo = ClipRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));
    let game_repo = GameRepository::new(Arc::clone(&db));

    let clip_service = ClipService::new(storage, assets, clip_repo.clone(), &config.ingest);
    let webhook_reconciler = WebhookReconciler::new(
        SignatureVerifier::new(config.webhook.mux_signing_secret.as_bytes()),
        clip_repo,
        notifier,
    );

    let state = AppState {
        db,
        clip_service,
        user_service: UserService::new(user_repo),
        game_service: GameService::new(game_repo),
        webhook_reconciler,
    };

    let app = api_router(config.ingest.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
