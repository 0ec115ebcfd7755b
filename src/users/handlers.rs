use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{dto::PublicUser, profile};
use crate::{
    auth::extractors::AuthSession,
    error::{AppError, Result},
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).patch(update_me).delete(delete_me))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn get_me(session: AuthSession) -> Json<PublicUser> {
    Json(PublicUser::from(&session.user))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    session: AuthSession,
    payload: std::result::Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<PublicUser>> {
    let Json(fields) = payload?;
    let user = profile::apply_update(state.users.as_ref(), &session.user, fields).await?;
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<PublicUser>> {
    let user = state
        .users
        .delete(session.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    state.notifier.dispatch_cancellation(&user.email, &user.name);

    info!(user_id = %user.id, "account deleted");
    Ok(Json(PublicUser::from(&user)))
}
