use serde_json::Value;

use crate::{
    config::TranslationConfig,
    error::{AppError, Result},
};

pub async fn translate(
    client: &reqwest::Client,
    config: &TranslationConfig,
    text: &str,
    target_lang: &str,
) -> Result<String> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("text is required".to_string()));
    }
    if target_lang.trim().is_empty() {
        return Err(AppError::BadRequest("targetLang is required".to_string()));
    }

    let response = client
        .get(&config.endpoint)
        .query(&[
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target_lang),
            ("dt", "t"),
            ("q", text),
        ])
        .send()
        .await
        .map_err(|e| AppError::UpstreamError(format!("Translation request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::UpstreamError(format!(
            "Translation provider returned {}",
            response.status()
        )));
    }

    let body: Value = response.json().await.map_err(|e| {
        AppError::UpstreamError(format!("Failed to parse translation response: {}", e))
    })?;

    parse_translation(&body).ok_or_else(|| {
        AppError::UpstreamError("Translation response had no translated text".to_string())
    })
}

/// The provider answers `[[["segment", "source", ...], ...], ...]`; the
/// translation is the concatenation of every segment's first element.
pub fn parse_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0)?.as_str())
        .collect();

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}
