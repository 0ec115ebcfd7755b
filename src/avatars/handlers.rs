use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::services::{self, AVATAR_CONTENT_TYPE, MAX_AVATAR_BYTES};
use crate::{
    auth::extractors::AuthSession,
    error::{AppError, Result},
    state::AppState,
};

const AVATAR_FIELD: &str = "avatar";

pub fn avatar_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me/avatar",
            post(upload_avatar)
                .delete(delete_avatar)
                // leave room so oversized files reach validation instead of a 413
                .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES * 4)),
        )
        .route("/users/:id/avatar", get(get_avatar))
}

/// POST /users/me/avatar (multipart, field `avatar`)
#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    session: AuthSession,
    mut mp: Multipart,
) -> Result<StatusCode> {
    let mut upload = None;
    while let Some(field) = mp.next_field().await? {
        if field.name() == Some(AVATAR_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, data) = upload.ok_or_else(|| {
        AppError::Validation("Please upload a PNG, JPG or JPEG file.".to_string())
    })?;

    let avatar = services::accept(data, &filename).await?;
    services::attach(state.users.as_ref(), session.user.id, avatar).await?;
    Ok(StatusCode::OK)
}

/// GET /users/:id/avatar
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = Uuid::parse_str(&id).map_err(|_| {
        warn!(%id, "malformed user id");
        AppError::NotFound("User avatar not found".into())
    })?;
    let avatar = services::fetch(state.users.as_ref(), user_id).await?;
    Ok(([(header::CONTENT_TYPE, AVATAR_CONTENT_TYPE)], avatar))
}

/// DELETE /users/me/avatar
#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn delete_avatar(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<StatusCode> {
    services::detach(state.users.as_ref(), session.user.id).await?;
    Ok(StatusCode::OK)
}
