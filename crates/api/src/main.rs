use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use onboard_cloud::fake::Unconfigured;
use onboard_cloud::{
    FcmPushSender, ObjectStore, PushSender, S3ObjectStore, SmsVerifier, TwilioVerify,
};
use onboard_events::{
    EmailDelivery, EventBus, NotificationConsumer, PasswordResetMailer, UnconfiguredMailer,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onboard_api::config::ServerConfig;
use onboard_api::router::build_app_router;
use onboard_api::state::{AppState, Providers};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "onboard_api=debug,onboard_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        session_limit = config.session_limit,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = onboard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    onboard_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    onboard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Providers ---
    let providers = build_providers(&config).await;

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let consumer_cancel = CancellationToken::new();
    let consumer_handle = tokio::spawn(NotificationConsumer::run(
        event_bus.subscribe(),
        consumer_cancel.clone(),
    ));
    tracing::info!("Event bus and notification consumer started");

    // --- Router ---
    let config = Arc::new(config);
    let state = AppState::new(pool.clone(), Arc::clone(&config), event_bus, providers);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    consumer_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), consumer_handle).await;
    tracing::info!("Notification consumer stopped");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Build vendor clients from configuration.
///
/// A vendor without configuration is replaced by a placeholder whose calls
/// fail with `NotConfigured`, surfaced to clients as 503.
async fn build_providers(config: &ServerConfig) -> Providers {
    let sms: Arc<dyn SmsVerifier> = match config.sms.clone() {
        Some(twilio) => Arc::new(TwilioVerify::new(twilio).expect("Failed to build SMS client")),
        None => {
            tracing::warn!("TWILIO_* not set, OTP verification is disabled");
            Arc::new(Unconfigured)
        }
    };

    let push: Arc<dyn PushSender> = match config.push.clone() {
        Some(fcm) => Arc::new(FcmPushSender::new(fcm).expect("Failed to build push client")),
        None => {
            tracing::warn!("FCM_SERVER_KEY not set, push notifications are disabled");
            Arc::new(Unconfigured)
        }
    };

    let storage: Arc<dyn ObjectStore> = match config.storage.clone() {
        Some(s3) => Arc::new(S3ObjectStore::connect(s3).await),
        None => {
            tracing::warn!("S3_BUCKET not set, profile image uploads are disabled");
            Arc::new(Unconfigured)
        }
    };

    let mailer: Arc<dyn PasswordResetMailer> = match config.email.clone() {
        Some(email) => Arc::new(EmailDelivery::new(email)),
        None => {
            tracing::warn!("SMTP_HOST not set, password reset mail is disabled");
            Arc::new(UnconfiguredMailer)
        }
    };

    Providers {
        sms,
        push,
        storage,
        mailer,
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
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
