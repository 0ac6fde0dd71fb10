use axum::{Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::{TranslateRequest, TranslateResponse},
    services::translation_service,
    utils::extractors::AppJson,
};

pub async fn translate(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TranslateRequest>,
) -> Result<Json<TranslateResponse>> {
    let translated_text = translation_service::translate(
        &state.http,
        &state.config.translation,
        &payload.text,
        &payload.target_lang,
    )
    .await?;

    Ok(Json(TranslateResponse { translated_text }))
}
