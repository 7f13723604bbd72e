//! Handlers for the authenticated account's own profile under `/user`.

use axum::extract::{Multipart, State};
use axum::Json;
use onboard_cloud::storage::profile_image_key;
use onboard_cloud::StoredObject;
use onboard_core::error::CoreError;
use onboard_db::models::user::UserResponse;
use onboard_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// GET /api/v1/user/details
pub async fn details(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(DataResponse::new(
        "User details fetched successfully",
        UserResponse::from(&user),
    )))
}

/// POST /api/v1/user/profile-image
///
/// Accepts a multipart form with a required `profileImage` field holding an
/// image. The file is written to object storage and its key recorded on the
/// account.
pub async fn upload_profile_image(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<StoredObject>>> {
    let mut upload: Option<(Option<String>, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(PROFILE_IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) = upload.ok_or_else(|| {
        AppError::BadRequest(format!("Missing required '{PROFILE_IMAGE_FIELD}' field"))
    })?;

    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "Unsupported content type '{content_type}'. Expected an image"
        )));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Profile image is empty".into()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "Profile image exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let key = profile_image_key(auth.user_id, file_name.as_deref());
    let stored = state
        .providers
        .storage
        .put_object(&key, data, &content_type)
        .await?;

    UserRepo::set_profile_image(&state.pool, auth.user_id, &stored.key)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    tracing::info!(
        user_id = auth.user_id,
        key = %stored.key,
        size = stored.size,
        "Profile image stored"
    );

    Ok(Json(DataResponse::new(
        "Profile Image Uploaded successfully",
        stored,
    )))
}
