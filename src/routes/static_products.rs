use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{StaticVisibility, ToggleRequest},
    utils::extractors::AppJson,
};

pub async fn get_hidden(State(state): State<AppState>) -> Result<Json<StaticVisibility>> {
    let visibility = state.visibility.get().await?;

    Ok(Json(visibility))
}

pub async fn toggle_hidden(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ToggleRequest>,
) -> Result<Json<StaticVisibility>> {
    let product_id = payload.product_id.trim();
    if product_id.is_empty() {
        return Err(AppError::BadRequest("productId is required".to_string()));
    }

    let visibility = state.visibility.toggle(product_id).await?;
    tracing::info!("Toggled visibility of static product {}", product_id);

    Ok(Json(visibility))
}
