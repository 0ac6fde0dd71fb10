use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{MessageResponse, Product, ProductInput, ProductPatch},
    services::image_service::ImageUpload,
    utils::{extractors::AppMultipart, product_form::parse_product_form},
};

//PRODUCT ROUTES
pub async fn create_product(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<(StatusCode, Json<Product>)> {
    let form = parse_product_form(multipart).await?;

    if form.images.is_empty() {
        return Err(AppError::BadRequest(
            "At least one image is required".to_string(),
        ));
    }

    let images = upload_images(&state, form.images).await?;

    let input = ProductInput {
        images: images.clone(),
        specs: form.specs.unwrap_or_default(),
        translations: form.translations.unwrap_or_default(),
        extra: form.extra,
    };

    let product = match state.products.create(input).await {
        Ok(product) => product,
        Err(e) => {
            discard_images(&state, &images).await;
            return Err(e);
        }
    };

    tracing::info!(
        "Product {} created with {} images",
        product.id,
        product.images.len()
    );

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<Product>> {
    let form = parse_product_form(multipart).await?;

    let current = state
        .products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    let images_changed = form.existing_images.is_some() || !form.images.is_empty();

    let kept: Vec<String> = match form.existing_images {
        Some(existing) => existing
            .into_iter()
            .filter(|url| {
                let owned = current.images.contains(url);
                if !owned {
                    tracing::warn!("Ignoring image {} not attached to product {}", url, id);
                }
                owned
            })
            .collect(),
        None => current.images.clone(),
    };

    if kept.is_empty() && form.images.is_empty() {
        return Err(AppError::BadRequest(
            "A product must keep at least one image".to_string(),
        ));
    }

    let uploaded = upload_images(&state, form.images).await?;

    let patch = ProductPatch {
        images: images_changed.then(|| kept.iter().chain(&uploaded).cloned().collect()),
        specs: form.specs,
        translations: form.translations,
        extra: form.extra,
    };

    let updated = match state.products.update(&id, patch).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            discard_images(&state, &uploaded).await;
            return Err(AppError::NotFound(format!("Product {} not found", id)));
        }
        Err(e) => {
            discard_images(&state, &uploaded).await;
            return Err(e);
        }
    };

    let dropped: Vec<String> = current
        .images
        .into_iter()
        .filter(|url| !updated.images.contains(url))
        .collect();
    discard_images(&state, &dropped).await;

    Ok(Json(updated))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let product = state
        .products
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    for url in &product.images {
        state.images.delete(url).await?;
    }

    if !state.products.remove(&id).await? {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }

    tracing::info!("Product {} deleted", product.id);

    Ok(Json(MessageResponse {
        message: "Product deleted".to_string(),
    }))
}

/// Uploads in order; on failure the images already stored are removed again.
async fn upload_images(state: &AppState, uploads: Vec<ImageUpload>) -> Result<Vec<String>> {
    let mut urls = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let file_name = upload.file_name.clone().unwrap_or_default();
        match state.images.upload(upload).await {
            Ok(url) => {
                tracing::debug!("Stored image {} as {}", file_name, url);
                urls.push(url);
            }
            Err(e) => {
                discard_images(state, &urls).await;
                return Err(e);
            }
        }
    }

    Ok(urls)
}

/// Best-effort removal of images no product references anymore.
async fn discard_images(state: &AppState, urls: &[String]) {
    for url in urls {
        if let Err(e) = state.images.delete(url).await {
            tracing::warn!("Failed to remove image {}: {}", url, e);
        }
    }
}
