use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction, types::Json};

use crate::{
    error::{AppError, Result},
    models::{ProductDocument, StoredProduct},
    store::Lookup,
};

/// Key for the transaction-scoped advisory lock that serialises id assignment.
const CREATE_LOCK_KEY: i64 = 0x7669_7472_696e_6501;

#[derive(sqlx::FromRow)]
struct ProductRow {
    object_id: String,
    doc: Json<ProductDocument>,
}

impl From<ProductRow> for StoredProduct {
    fn from(row: ProductRow) -> Self {
        StoredProduct {
            native_id: row.object_id,
            doc: row.doc.0,
        }
    }
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<StoredProduct>> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT object_id, doc FROM products ORDER BY seq ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredProduct::from).collect())
}

pub async fn find_by_lookup(pool: &PgPool, lookup: &Lookup) -> Result<Option<StoredProduct>> {
    let row = match lookup {
        Lookup::Numeric(n) => {
            sqlx::query_as::<_, ProductRow>(
                "SELECT object_id, doc FROM products
                 WHERE doc -> 'id' = to_jsonb($1::bigint)
                 ORDER BY seq ASC LIMIT 1",
            )
            .bind(n)
            .fetch_optional(pool)
            .await?
        }
        Lookup::Text(s) => {
            sqlx::query_as::<_, ProductRow>(
                "SELECT object_id, doc FROM products
                 WHERE doc -> 'id' = to_jsonb($1::text)
                 ORDER BY seq ASC LIMIT 1",
            )
            .bind(s)
            .fetch_optional(pool)
            .await?
        }
        Lookup::Native(s) => {
            sqlx::query_as::<_, ProductRow>(
                "SELECT object_id, doc FROM products WHERE object_id = $1",
            )
            .bind(s)
            .fetch_optional(pool)
            .await?
        }
    };

    Ok(row.map(StoredProduct::from))
}

/// Inserts a new document under the advisory lock so that concurrent
/// creators compute distinct sequential ids.
pub async fn insert_with_next_id(
    pool: &PgPool,
    native_id: &str,
    build: impl FnOnce(i64) -> ProductDocument,
) -> Result<StoredProduct> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CREATE_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    // Mirrors `LegacyId::counter_value`: integral numbers and plain digit
    // strings within bigint range count, everything else is 0.
    let max_id: i64 = sqlx::query_scalar(
        r#"
        SELECT GREATEST(COALESCE(MAX(
            CASE jsonb_typeof(doc -> 'id')
                WHEN 'number' THEN
                    CASE
                        WHEN (doc -> 'id')::numeric = trunc((doc -> 'id')::numeric)
                            AND (doc -> 'id')::numeric
                                BETWEEN -9223372036854775808 AND 9223372036854775807
                            THEN (doc -> 'id')::numeric::bigint
                        ELSE 0
                    END
                WHEN 'string' THEN
                    CASE
                        WHEN doc ->> 'id' !~ '^-?[0-9]+$' THEN 0
                        WHEN (doc ->> 'id')::numeric
                                BETWEEN -9223372036854775808 AND 9223372036854775807
                            THEN (doc ->> 'id')::bigint
                        ELSE 0
                    END
                ELSE 0
            END
        ), 0), 0)
        FROM products
        "#,
    )
    .fetch_one(&mut *tx)
    .await?;

    let next_id = max_id
        .checked_add(1)
        .ok_or_else(|| AppError::InternalError("Product id counter exhausted".to_string()))?;

    let doc = build(next_id);

    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (object_id, doc) VALUES ($1, $2) RETURNING object_id, doc",
    )
    .bind(native_id)
    .bind(Json(&doc))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row.into())
}

/// Shallow top-level merge: keys in `patch` replace the stored ones.
pub async fn merge_patch(
    pool: &PgPool,
    native_id: &str,
    patch: &Map<String, Value>,
) -> Result<Option<StoredProduct>> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET doc = doc || $2 WHERE object_id = $1 RETURNING object_id, doc",
    )
    .bind(native_id)
    .bind(Json(patch))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(StoredProduct::from))
}

pub async fn delete_product(pool: &PgPool, native_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE object_id = $1")
        .bind(native_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
