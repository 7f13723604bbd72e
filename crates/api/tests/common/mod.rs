#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use onboard_api::auth::jwt::JwtConfig;
use onboard_api::auth::password::hash_password;
use onboard_api::config::ServerConfig;
use onboard_api::router::build_app_router;
use onboard_api::state::{AppState, Providers};
use onboard_cloud::fake::{MemoryObjectStore, RecordingPushSender, StaticCodeVerifier};
use onboard_core::status::AccountStatus;
use onboard_db::models::user::{CreateUser, User};
use onboard_db::repositories::UserRepo;
use onboard_events::{EmailError, EventBus, PasswordResetMailer};

/// Code the fake SMS provider accepts.
pub const VALID_OTP: &str = "123456";

/// Password of every account made by [`create_user`].
pub const PASSWORD: &str = "correct-horse-1";

/// Build a test `ServerConfig` with safe defaults and no vendor sections.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session_limit: 3,
        max_upload_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        email: None,
        sms: None,
        push: None,
        storage: None,
    }
}

/// Mailer that records `(to, name)` pairs instead of talking SMTP.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordResetMailer for RecordingMailer {
    async fn send_password_reset(&self, to_email: &str, name: &str) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), name.to_string()));
        Ok(())
    }
}

/// The application router plus handles on the fake providers behind it.
pub struct TestApp {
    pub router: Router,
    pub sms: Arc<StaticCodeVerifier>,
    pub push: Arc<RecordingPushSender>,
    pub storage: Arc<MemoryObjectStore>,
    pub mailer: Arc<RecordingMailer>,
    pub event_bus: Arc<EventBus>,
}

impl TestApp {
    /// A fresh clone of the router for one `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and in-memory providers.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let sms = Arc::new(StaticCodeVerifier::new(VALID_OTP));
    let push = Arc::new(RecordingPushSender::default());
    let storage = Arc::new(MemoryObjectStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let event_bus = Arc::new(EventBus::default());

    let providers = Providers {
        sms: sms.clone(),
        push: push.clone(),
        storage: storage.clone(),
        mailer: mailer.clone(),
    };
    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::clone(&event_bus),
        providers,
    );

    TestApp {
        router: build_app_router(state, &config),
        sms,
        push,
        storage,
        mailer,
        event_bus,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a verified, ACTIVE account with [`PASSWORD`] directly.
pub async fn create_user(pool: &PgPool, email: &str, mobile: &str, primary: bool) -> User {
    let input = CreateUser {
        name: "Tester".to_string(),
        email: email.to_string(),
        country_code: "+91".to_string(),
        mobile: mobile.to_string(),
        password_hash: hash_password(PASSWORD).expect("hashing should succeed"),
        is_primary_account_holder: primary,
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    UserRepo::set_status(pool, user.id, AccountStatus::Active)
        .await
        .expect("status update should succeed");
    user
}

/// Log in over HTTP with a device id and return the response.
pub async fn login(app: Router, email: &str, device_id: &str) -> Response<Body> {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    post_json(
        app,
        &format!("/api/v1/user/login?deviceId={device_id}&deviceToken=token-{device_id}"),
        body,
    )
    .await
}

/// Log in and return the issued bearer token, asserting admission.
pub async fn login_token(app: Router, email: &str, device_id: &str) -> String {
    let response = login(app, email, device_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["token"]
        .as_str()
        .expect("admitted login must carry a token")
        .to_string()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a single-file multipart form.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
    token: &str,
) -> Response<Body> {
    let boundary = "onboard-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
