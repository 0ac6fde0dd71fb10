use axum::extract::Multipart;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    error::{AppError, Result},
    models::RESERVED_FIELDS,
    services::image_service::{ImageUpload, extension_for},
};

/// Multipart body of product create/update requests.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub images: Vec<ImageUpload>,
    pub specs: Option<Vec<Value>>,
    pub translations: Option<Map<String, Value>>,
    pub existing_images: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

pub async fn parse_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "images" || name == "image" || field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            // Browsers submit an empty part for an untouched file input.
            if bytes.is_empty() {
                continue;
            }

            if extension_for(&content_type).is_none() {
                return Err(AppError::BadRequest(format!(
                    "Unsupported image type: {}",
                    content_type
                )));
            }

            form.images.push(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        match name.as_str() {
            "specs" => form.specs = parse_json_field("specs", &text)?,
            "translations" => form.translations = parse_json_field("translations", &text)?,
            "existingImages" => {
                form.existing_images = parse_json_field("existingImages", &text)?
            }
            "" => {}
            key if RESERVED_FIELDS.contains(&key) => {
                tracing::debug!("Ignoring reserved form field {}", key);
            }
            key => {
                form.extra.insert(key.to_string(), pass_through_value(text));
            }
        }
    }

    Ok(form)
}

/// Parses a JSON-in-text form field. A blank field counts as absent.
pub fn parse_json_field<T: DeserializeOwned>(name: &str, text: &str) -> Result<Option<T>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("Malformed JSON in {}: {}", name, e)))
}

/// Form values are text; the boolean publish flags are the only ones stored
/// as anything else.
pub fn pass_through_value(text: String) -> Value {
    match text.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_fields_parse_or_reject() {
        let specs: Option<Vec<Value>> =
            parse_json_field("specs", r#"[{"k":"color","v":"red"}]"#).unwrap();
        assert_eq!(specs, Some(vec![json!({"k": "color", "v": "red"})]));

        let blank: Option<Vec<Value>> = parse_json_field("specs", "  ").unwrap();
        assert_eq!(blank, None);

        let err = parse_json_field::<Map<String, Value>>("translations", "{oops").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("translations")));

        let wrong_shape = parse_json_field::<Vec<String>>("existingImages", r#"{"a":1}"#);
        assert!(wrong_shape.is_err());
    }

    #[test]
    fn flags_become_booleans_everything_else_stays_text() {
        assert_eq!(pass_through_value("true".to_string()), json!(true));
        assert_eq!(pass_through_value("false".to_string()), json!(false));
        assert_eq!(pass_through_value("19.99".to_string()), json!("19.99"));
        assert_eq!(pass_through_value("published".to_string()), json!("published"));
    }
}
