use std::sync::Arc;

use onboard_cloud::{ObjectStore, PushSender, SmsVerifier};
use onboard_core::admission::SessionAdmission;
use onboard_db::slot_store::PgSlotStore;
use onboard_events::{EventBus, NotificationDispatcher, PasswordResetMailer};

use crate::auth::jwt::JwtIssuer;
use crate::config::ServerConfig;

/// Vendor integrations injected into [`AppState`].
#[derive(Clone)]
pub struct Providers {
    pub sms: Arc<dyn SmsVerifier>,
    pub push: Arc<dyn PushSender>,
    pub storage: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn PasswordResetMailer>,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: onboard_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Login-slot admission over the Postgres stores.
    pub admission: Arc<SessionAdmission>,
    /// Account events (login, sign-up, logout).
    pub event_bus: Arc<EventBus>,
    pub providers: Providers,
}

impl AppState {
    /// Wire the admission controller to Postgres, JWT issuance and the event bus.
    pub fn new(
        pool: onboard_db::DbPool,
        config: Arc<ServerConfig>,
        event_bus: Arc<EventBus>,
        providers: Providers,
    ) -> Self {
        let store = Arc::new(PgSlotStore::new(pool.clone()));
        let admission = SessionAdmission::new(
            store.clone(),
            store,
            Arc::new(JwtIssuer::new(config.jwt.clone())),
            Arc::new(NotificationDispatcher::new(Arc::clone(&event_bus))),
        )
        .with_limit(config.session_limit);

        Self {
            pool,
            config,
            admission: Arc::new(admission),
            event_bus,
            providers,
        }
    }
}
