//! Handlers for the `/notification` resource.
//!
//! A notification is pushed to the receiver's most recent registered device
//! and then recorded with status `SENT`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use onboard_cloud::PushMessage;
use onboard_core::notification::STATUS_SENT;
use onboard_core::types::DbId;
use onboard_db::models::notification::{CreateNotification, Notification};
use onboard_db::repositories::{NotificationRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /notification/send`.
#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub receiver_id: DbId,
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Description must be 1 to 2000 characters"))]
    pub description: String,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Query parameters for `GET /notification/list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    pub notification_id: Option<DbId>,
}

/// A single notification when one was requested by id, otherwise the list.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    One(Notification),
    Many(Vec<Notification>),
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/notification/send
pub async fn send(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SendNotificationRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Notification>>)> {
    input.validate()?;

    let receiver = UserRepo::find_by_id(&state.pool, input.receiver_id)
        .await?
        .ok_or_else(|| AppError::NotFound("This receiver does not exist".into()))?;

    if SessionRepo::list_by_user(&state.pool, receiver.id).await?.is_empty() {
        return Err(AppError::NotFound("Receiver session data not found".into()));
    }
    let device_token = SessionRepo::latest_with_device_token(&state.pool, receiver.id)
        .await?
        .and_then(|session| session.device_token)
        .ok_or_else(|| AppError::NotFound("Device token not found".into()))?;

    state
        .providers
        .push
        .send(&PushMessage {
            device_token,
            title: input.title.clone(),
            body: input.description.clone(),
            image_url: input.image_url.clone(),
        })
        .await?;

    let notification = NotificationRepo::create(
        &state.pool,
        &CreateNotification {
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            status: STATUS_SENT.to_string(),
            sender_id: auth.user_id,
            sender_name: auth.name,
            receiver_id: receiver.id,
            receiver_name: receiver.name,
        },
    )
    .await?;

    tracing::info!(
        notification_id = notification.id,
        sender_id = notification.sender_id,
        receiver_id = notification.receiver_id,
        "Notification pushed",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Notification send successfully!", notification)),
    ))
}

/// GET /api/v1/notification/list?notificationId=..
///
/// Without `notificationId`, every notification received by the caller,
/// newest first. With it, that one notification, provided it was addressed
/// to the caller.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListNotificationsQuery>,
) -> AppResult<Json<DataResponse<NotificationPayload>>> {
    match params.notification_id {
        Some(id) => {
            let notification = NotificationRepo::find_for_receiver(&state.pool, id, auth.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;
            Ok(Json(DataResponse::new(
                "Notification details fetched successfully",
                NotificationPayload::One(notification),
            )))
        }
        None => {
            let notifications =
                NotificationRepo::list_for_receiver(&state.pool, auth.user_id).await?;
            Ok(Json(DataResponse::new(
                "Notification list fetched successfully",
                NotificationPayload::Many(notifications),
            )))
        }
    }
}
