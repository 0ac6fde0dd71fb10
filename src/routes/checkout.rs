use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{CheckoutRequest, CheckoutResponse},
    services::stripe_service,
    utils::extractors::AppJson,
};

pub async fn create_checkout_session(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    stripe_service::validate_cart(&payload.cart)?;

    let stripe = state
        .config
        .stripe
        .as_ref()
        .ok_or_else(|| AppError::ConfigError("STRIPE_SECRET_KEY not set".to_string()))?;

    let url = stripe_service::create_checkout_session(&state.http, stripe, &payload.cart).await?;

    tracing::info!("Created checkout session for {} items", payload.cart.len());

    Ok(Json(CheckoutResponse { url }))
}
