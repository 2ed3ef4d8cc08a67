use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pagewright_content::{ContentStore, PgContentStore, SeoCache};
use pagewright_core::seo::SeoDefaults;
use pagewright_events::{ChangeBus, PgChangeListener};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagewright_api::config::ServerConfig;
use pagewright_api::editor::{start_reaper, EditorSessions};
use pagewright_api::router::build_app_router;
use pagewright_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagewright_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = pagewright_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    pagewright_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    pagewright_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Change feed ---
    let change_bus = Arc::new(ChangeBus::default());
    let listener_cancel = CancellationToken::new();
    let listener = PgChangeListener::connect(&pool)
        .await
        .expect("Failed to LISTEN for content changes");
    let listener_handle = tokio::spawn(listener.run(Arc::clone(&change_bus), listener_cancel.clone()));
    tracing::info!("Change listener started");

    // --- Content layer ---
    let store: Arc<dyn ContentStore> = Arc::new(PgContentStore::new(pool.clone()));
    let seo_cache = Arc::new(SeoCache::new(
        store.clone(),
        SeoDefaults::new(config.site_url.clone()),
        config.content.seo_ttl,
    ));
    let seo_watch = seo_cache
        .watch(change_bus.as_ref())
        .expect("Failed to subscribe SEO cache to change feed");
    let sessions = Arc::new(EditorSessions::new());
    let reaper_handle = start_reaper(Arc::clone(&sessions), config.session_idle_timeout);

    // --- App state ---
    let state = AppState {
        pool,
        store,
        config: Arc::new(config.clone()),
        change_bus: Arc::clone(&change_bus),
        seo_cache,
        sessions: Arc::clone(&sessions),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    reaper_handle.abort();
    sessions.close_all().await;
    seo_watch.unsubscribe().await;

    listener_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), listener_handle).await;
    change_bus.close();
    tracing::info!("Change feed shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
