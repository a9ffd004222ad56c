//! # EduBridge Server
//!
//! The entry point that assembles the platform from its adapters.

use std::path::PathBuf;
use std::sync::Arc;

use api_adapters::{ApiMetrics, AppState, Gateway, OpenRouterClient};
use auth_adapters::{Argon2Hasher, JwtAuthority};
use configs::Settings;
use domains::ports::{
    CompletionClient, CredentialHasher, FileStore, Mailer, RealtimePush, TokenAuthority, UserRepo,
};
use services::assistant::ModelRouting;
use services::{
    AccountService, AdminService, AssignmentService, AssistantService, ChatService, CourseService,
    FeedService, NotificationService, Notifier,
};
use storage_adapters::{LocalFileStore, LogMailer, MemoryDocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration: .env, config/default.toml, then EDUBRIDGE__* overrides
    let settings = Settings::load()?;
    init_tracing(&settings);

    // 2. Storage: snapshot-backed document store plus local media files
    let store = Arc::new(MemoryDocumentStore::load(&settings.storage.snapshot_path).await?);
    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
        PathBuf::from(&settings.storage.media_dir),
        settings.storage.media_url_prefix.clone(),
    ));
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new());

    // 3. Auth: JWT issuance and Argon2 password hashing
    let tokens: Arc<dyn TokenAuthority> = Arc::new(JwtAuthority::new(
        &settings.auth.jwt_secret,
        settings.auth.token_ttl_hours,
    ));
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new());

    // 4. Realtime gateway, wired into notification fan-out
    let gateway = Arc::new(Gateway::new());
    let push: Arc<dyn RealtimePush> = gateway.clone();
    let notifier = Arc::new(Notifier::new(
        store.clone(),
        store.clone(),
        mailer,
        push,
    ));

    // 5. Upstream AI client
    let ai: Arc<dyn CompletionClient> = Arc::new(OpenRouterClient::new(
        settings.ai.base_url.clone(),
        settings.ai.api_key.clone(),
    ));
    let models = ModelRouting {
        coder: settings.ai.coder_model.clone(),
        reasoning: settings.ai.reasoning_model.clone(),
    };

    // 6. Services over the shared store
    let users: Arc<dyn UserRepo> = store.clone();
    let state = AppState {
        accounts: Arc::new(AccountService::new(
            store.clone(),
            files.clone(),
            hasher,
            tokens.clone(),
        )),
        admin: Arc::new(AdminService::new(store.clone(), store.clone())),
        assignments: Arc::new(AssignmentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            files.clone(),
            notifier.clone(),
        )),
        assistant: Arc::new(AssistantService::new(
            ai,
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            models,
        )),
        chat: Arc::new(ChatService::new(store.clone(), store.clone(), store.clone())),
        courses: Arc::new(CourseService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            notifier,
        )),
        feed: Arc::new(FeedService::new(store.clone(), store.clone(), files)),
        notifications: Arc::new(NotificationService::new(store.clone())),
        users,
        tokens,
        gateway,
        metrics: Arc::new(ApiMetrics::new()),
    };

    // 7. HTTP surface
    let app = api_adapters::router(state);
    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 EduBridge API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. Snapshot on the way out so a restart picks up where we left off
    store.save(&settings.storage.snapshot_path).await?;
    tracing::info!(path = %settings.storage.snapshot_path, "snapshot written, shutting down");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if settings.environment.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installation failed");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation failed")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
