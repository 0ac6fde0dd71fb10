mod identifier;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{Product, ProductInput, ProductPatch, StaticVisibility},
};

pub use identifier::{Lookup, find_in, generate_native_id, is_native_id, resolve_identifier};
pub use memory::{MemoryProductStore, MemoryVisibilityStore};
pub use postgres::{PgProductStore, PgVisibilityStore};

/// Durable CRUD over product documents.
///
/// Every `id: &str` argument is resolved through [`resolve_identifier`], so
/// integer ids, string ids and native ids are interchangeable.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products in storage order.
    async fn list(&self) -> Result<Vec<Product>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>>;

    /// Assigns the next sequential integer id and stamps both timestamps.
    async fn create(&self, input: ProductInput) -> Result<Product>;

    /// Shallow update; `None` when no product resolves.
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>>;

    /// Whether a product was actually deleted.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait VisibilityStore: Send + Sync {
    async fn get(&self) -> Result<StaticVisibility>;

    async fn toggle(&self, id: &str) -> Result<StaticVisibility>;
}
