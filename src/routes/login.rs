use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest},
    utils::extractors::AppJson,
};

pub async fn admin_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    if payload.password != state.config.admin.password {
        tracing::warn!("Failed admin login attempt");
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    Ok(Json(AuthResponse {
        token: state.config.admin.token.clone(),
    }))
}
