use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        extractors::AuthSession,
        password::hash_password_blocking,
        services::find_by_credentials,
        sessions::SessionManager,
    },
    error::Result,
    state::AppState,
    users::{
        dto::PublicUser,
        repo_types::NewUser,
        validation::{validate_age, validate_email, validate_name, validate_password},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/logoutAll", post(logout_all))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;

    let name = validate_name(&payload.name)?;
    let email = validate_email(&payload.email)?;
    let password = validate_password(&payload.password)?;
    let age = validate_age(payload.age)?;

    let new_user = NewUser {
        name,
        email,
        password_hash: hash_password_blocking(password).await?,
        age,
    };

    let user = state.users.insert(new_user).await?;
    state.notifier.dispatch_welcome(&user.email, &user.name);

    let token = SessionManager::from_ref(&state).issue(&user).await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(payload) = payload?;

    let user = find_by_credentials(state.users.as_ref(), &payload.email, &payload.password).await?;
    let token = SessionManager::from_ref(&state).issue(&user).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        user: PublicUser::from(&user),
        token,
    }))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn logout(State(state): State<AppState>, session: AuthSession) -> Result<StatusCode> {
    SessionManager::from_ref(&state)
        .revoke(session.user.id, &session.token)
        .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn logout_all(State(state): State<AppState>, session: AuthSession) -> Result<StatusCode> {
    SessionManager::from_ref(&state)
        .revoke_all(session.user.id)
        .await?;
    Ok(StatusCode::OK)
}
