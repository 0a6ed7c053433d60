//! Talebox HTTP Server
//!
//! Main entry point for the story API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    Clock, QuotaStorePort, QuotaTracker, SpeechSynthesizer, StoryComposer, StoryPipeline,
    SystemClock,
};
use axum::http::{HeaderName, HeaderValue, Method};
use infrastructure::{
    AppConfig, InMemoryQuotaStore, QuotaStoreKind, SpeechSynthesisAdapter, SqliteQuotaStore,
    StoryGenerationAdapter, create_pool, init_tracing,
};
use presentation_http::{
    error::set_expose_internal_errors,
    handlers::stories::{QUOTA_REMAINING_HEADER, STORY_DURATION_HEADER},
    middleware::{IdentityResolver, SESSION_HEADER, SessionSigner},
    routes,
    state::AppState,
    tasks::spawn_quota_purge_task,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let log_format = init_tracing(&config.server, &config.telemetry)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        ?log_format,
        "Talebox starting"
    );
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.inference.default_model,
        daily_limit = config.quota.daily_limit,
        "Configuration loaded"
    );

    set_expose_internal_errors(!config.is_production());

    let catalog = Arc::new(
        config
            .voice_catalog()
            .map_err(|e| anyhow::anyhow!("Invalid voice configuration: {e}"))?,
    );

    let quota_store: Arc<dyn QuotaStorePort> = match config.quota.store {
        QuotaStoreKind::Memory => {
            warn!("Using in-memory quota store; counts reset on restart");
            Arc::new(InMemoryQuotaStore::new())
        },
        QuotaStoreKind::Sqlite => {
            let pool = create_pool(&config.database)?;
            info!(path = %config.database.path, "Quota store ready");
            Arc::new(SqliteQuotaStore::new(Arc::new(pool)))
        },
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let quota = Arc::new(QuotaTracker::new(quota_store, clock));

    let generator = Arc::new(
        StoryGenerationAdapter::new(config.inference.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize story generation: {e}"))?,
    );
    let narrator = Arc::new(
        SpeechSynthesisAdapter::new(config.speech.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize speech synthesis: {e}"))?,
    );

    let composer = StoryComposer::with_config(
        generator.clone(),
        config.story.composer_config(&config.inference),
    );
    let synthesizer =
        SpeechSynthesizer::with_config(narrator.clone(), config.story.synthesizer_config());

    let pipeline = StoryPipeline::new(
        Arc::clone(&quota),
        Arc::new(composer),
        Arc::new(synthesizer),
        catalog,
        config.pipeline_config(),
    );

    let signer = match config.server.session_secret.as_deref() {
        Some(secret) => SessionSigner::new(secret),
        None => {
            warn!("No session secret configured; issued session ids expire on restart");
            SessionSigner::ephemeral()
        },
    }
    .map_err(|e| anyhow::anyhow!("Invalid session secret: {e}"))?;
    if config.server.trust_forwarded_for {
        info!("Keying quota on X-Forwarded-For from the fronting proxy");
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
        story_generator: generator,
        narrator,
        identity: Arc::new(IdentityResolver::new(
            signer,
            config.server.trust_forwarded_for,
        )),
    };

    let purge_task = (config.quota.purge_interval_secs > 0).then(|| {
        spawn_quota_purge_task(
            Arc::clone(&quota),
            Duration::from_secs(config.quota.purge_interval_secs),
        )
    });

    let max_body = config.server.max_body_size_json_bytes;
    let app = routes::create_router_with_limit(state, max_body);

    let cors_layer = build_cors_layer(&config);

    let app = app
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http());

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{addr}");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
    .await?;

    if let Some(task) = purge_task {
        task.abort();
    }

    info!("Server shutdown complete");

    Ok(())
}

/// CORS for the story form; any origin in development when none are listed
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let exposed = [
        HeaderName::from_static(STORY_DURATION_HEADER),
        HeaderName::from_static(QUOTA_REMAINING_HEADER),
        axum::http::header::CONTENT_DISPOSITION,
        axum::http::header::RETRY_AFTER,
        HeaderName::from_static(SESSION_HEADER),
    ];

    if !config.server.cors_enabled {
        return CorsLayer::new();
    }

    if config.server.allowed_origins.is_empty() {
        if config.is_production() {
            warn!("No CORS origins configured in production; cross-origin requests are blocked");
            return CorsLayer::new();
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(exposed);
    }

    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .expose_headers(exposed)
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    info!("Waiting up to {:?} for in-flight stories to finish", timeout);
}
