use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ShippingLabelRequest, ShippingLabelResponse},
    services::shippo_service,
    utils::extractors::AppJson,
};

pub async fn create_label(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ShippingLabelRequest>,
) -> Result<Json<ShippingLabelResponse>> {
    let shippo = state
        .config
        .shippo
        .as_ref()
        .ok_or_else(|| AppError::ConfigError("SHIPPO_API_KEY not set".to_string()))?;

    let label = shippo_service::create_label(&state.http, shippo, &payload).await?;

    Ok(Json(label))
}
