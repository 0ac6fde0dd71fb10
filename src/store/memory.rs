use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use super::{
    ProductStore, VisibilityStore,
    identifier::{find_in, generate_native_id, is_native_id},
};
use crate::{
    error::{AppError, Result},
    models::{
        LegacyId, Product, ProductDocument, ProductInput, ProductPatch, StaticVisibility,
        StoredProduct,
    },
};

/// Process-local product store.
///
/// Readers clone the current snapshot; writers hold the write lock for the
/// whole read-modify-write and then swap in a new snapshot, so a snapshot is
/// never mutated in place.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<Arc<Vec<StoredProduct>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<StoredProduct>) -> Self {
        Self {
            products: RwLock::new(Arc::new(products)),
        }
    }

    /// Loads a JSON array of product documents as written by older
    /// revisions: `id` may be an integer, a string or absent, and `_id` may
    /// hold the native id. `mongoexport` output is accepted as well; its
    /// extended-JSON wrappers (`$oid`, `$date`, `$numberLong`, ...) are
    /// unwrapped to plain values.
    pub async fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let store = Self::from_json(&raw)?;
        tracing::info!("Loaded product seed from {}", path.display());

        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(Self::with_products(parse_seed(raw)?))
    }

    async fn snapshot(&self) -> Arc<Vec<StoredProduct>> {
        self.products.read().await.clone()
    }
}

pub(crate) fn parse_seed(raw: &str) -> Result<Vec<StoredProduct>> {
    let documents: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid product seed file: {}", e)))?;

    documents
        .into_iter()
        .map(|document| {
            let Value::Object(mut fields) = unwrap_extended_json(document) else {
                return Err(AppError::ConfigError(
                    "Product seed entries must be objects".to_string(),
                ));
            };

            let native_id = match fields.remove("_id") {
                Some(Value::String(s)) if is_native_id(&s) => s.to_ascii_lowercase(),
                _ => generate_native_id(),
            };

            let doc: ProductDocument = serde_json::from_value(Value::Object(fields))
                .map_err(|e| AppError::ConfigError(format!("Invalid product document: {}", e)))?;

            Ok(StoredProduct { native_id, doc })
        })
        .collect()
}

/// Replaces single-key extended-JSON wrappers with the plain value they
/// stand for. Unknown `$` keys are left untouched.
fn unwrap_extended_json(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_extended_json).collect()),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(plain) = map.iter().next().and_then(|(k, v)| extended_scalar(k, v)) {
                    return plain;
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, unwrap_extended_json(value)))
                    .collect(),
            )
        }
        other => other,
    }
}

fn extended_scalar(key: &str, inner: &Value) -> Option<Value> {
    match key {
        "$oid" => inner.as_str().map(|s| Value::String(s.to_string())),
        "$numberLong" | "$numberInt" => inner.as_str()?.parse::<i64>().ok().map(Value::from),
        "$numberDouble" | "$numberDecimal" => inner
            .as_str()?
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        // Relaxed mode writes an ISO string, canonical mode epoch millis.
        "$date" => match unwrap_extended_json(inner.clone()) {
            Value::String(s) => Some(Value::String(s)),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|at| Value::String(at.to_rfc3339())),
            _ => None,
        },
        _ => None,
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        let products = self.snapshot().await;
        Ok(products
            .iter()
            .cloned()
            .map(StoredProduct::into_product)
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        let products = self.snapshot().await;
        Ok(find_in(&products, id).cloned().map(StoredProduct::into_product))
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        let mut guard = self.products.write().await;

        let next_id = guard
            .iter()
            .filter_map(|p| p.doc.id.as_ref())
            .map(LegacyId::counter_value)
            .fold(0, i64::max)
            .checked_add(1)
            .ok_or_else(|| AppError::InternalError("Product id counter exhausted".to_string()))?;

        let stored = StoredProduct {
            native_id: generate_native_id(),
            doc: ProductDocument::new(next_id, input, Utc::now()),
        };

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(stored.clone());
        *guard = Arc::new(next);

        Ok(stored.into_product())
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>> {
        let mut guard = self.products.write().await;

        let Some(native_id) = find_in(&guard, id).map(|p| p.native_id.clone()) else {
            return Ok(None);
        };

        let mut next: Vec<StoredProduct> = guard.iter().cloned().collect();
        let mut updated = None;
        for product in next.iter_mut().filter(|p| p.native_id == native_id) {
            product.doc.apply(patch.clone(), Utc::now());
            updated = Some(product.clone());
        }
        *guard = Arc::new(next);

        Ok(updated.map(StoredProduct::into_product))
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut guard = self.products.write().await;

        let Some(native_id) = find_in(&guard, id).map(|p| p.native_id.clone()) else {
            return Ok(false);
        };

        let next: Vec<StoredProduct> = guard
            .iter()
            .filter(|p| p.native_id != native_id)
            .cloned()
            .collect();
        *guard = Arc::new(next);

        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryVisibilityStore {
    state: Mutex<StaticVisibility>,
}

impl MemoryVisibilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisibilityStore for MemoryVisibilityStore {
    async fn get(&self) -> Result<StaticVisibility> {
        Ok(self.state.lock().await.clone())
    }

    async fn toggle(&self, id: &str) -> Result<StaticVisibility> {
        let mut state = self.state.lock().await;
        state.toggle(id);
        Ok(state.clone())
    }
}
