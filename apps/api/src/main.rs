mod config;
mod db;
mod document;
mod editor;
mod errors;
mod generation;
mod llm_client;
mod models;
mod preview;
mod reorder;
mod routes;
mod session;
mod state;
mod steps;
mod storage;
mod sync;

#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::editor::{SchemaValidator, ValidationRules};
use crate::generation::LlmTextGenerator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::{SessionRegistry, SessionServices};
use crate::state::AppState;
use crate::storage::{PgResumeStore, S3PhotoStorage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let rules = ValidationRules {
        photo_max_bytes: config.photo_max_bytes,
    };
    let services = SessionServices {
        store: Arc::new(PgResumeStore::new(db)),
        photos: Arc::new(S3PhotoStorage::new(
            s3,
            config.s3_bucket.clone(),
            &config.s3_public_url,
        )),
        validator: Arc::new(SchemaValidator::new(rules, config.validation_debounce)),
        generator: Arc::new(LlmTextGenerator::new(llm)),
        autosave_debounce: config.autosave_debounce,
    };
    info!(
        "Session services ready (validation debounce {:?}, autosave debounce {:?})",
        config.validation_debounce, config.autosave_debounce
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        services,
        sessions: Arc::new(SessionRegistry::new()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
/// Path-style addressing keeps photo URLs valid against MinIO.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "vitae-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
