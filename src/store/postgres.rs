use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{
    ProductStore, VisibilityStore,
    identifier::{generate_native_id, resolve_identifier},
};
use crate::{
    database,
    error::Result,
    models::{
        Product, ProductDocument, ProductInput, ProductPatch, StaticVisibility, StoredProduct,
    },
    queries::{product_queries, visibility_queries},
};

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn resolve(&self, id: &str) -> Result<Option<StoredProduct>> {
        for lookup in resolve_identifier(id) {
            if let Some(found) = product_queries::find_by_lookup(&self.pool, &lookup).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        let products = product_queries::find_all(&self.pool).await?;
        Ok(products.into_iter().map(StoredProduct::into_product).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.resolve(id).await?.map(StoredProduct::into_product))
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        let native_id = generate_native_id();
        let now = Utc::now();

        let stored = product_queries::insert_with_next_id(&self.pool, &native_id, |next_id| {
            ProductDocument::new(next_id, input, now)
        })
        .await?;

        let product = stored.into_product();
        tracing::info!("Created product {} ({})", product.id, native_id);

        Ok(product)
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>> {
        let Some(existing) = self.resolve(id).await? else {
            return Ok(None);
        };

        let document_patch = patch.to_document_patch(Utc::now());
        let updated =
            product_queries::merge_patch(&self.pool, &existing.native_id, &document_patch).await?;

        Ok(updated.map(StoredProduct::into_product))
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let Some(existing) = self.resolve(id).await? else {
            return Ok(false);
        };

        let deleted = product_queries::delete_product(&self.pool, &existing.native_id).await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<()> {
        database::check_health(&self.pool).await
    }
}

#[derive(Debug, Clone)]
pub struct PgVisibilityStore {
    pool: PgPool,
}

impl PgVisibilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisibilityStore for PgVisibilityStore {
    async fn get(&self) -> Result<StaticVisibility> {
        let hidden = visibility_queries::get_hidden(&self.pool).await?;
        Ok(StaticVisibility { hidden })
    }

    async fn toggle(&self, id: &str) -> Result<StaticVisibility> {
        let hidden = visibility_queries::toggle_hidden(&self.pool, id).await?;
        Ok(StaticVisibility { hidden })
    }
}
