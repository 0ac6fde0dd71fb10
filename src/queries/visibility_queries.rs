use sqlx::PgPool;

use crate::error::Result;

/// Key of the singleton row; never a valid product id.
pub const VISIBILITY_KEY: &str = "__static_visibility__";

pub async fn get_hidden(pool: &PgPool) -> Result<Vec<String>> {
    let hidden: Option<Vec<String>> =
        sqlx::query_scalar("SELECT hidden FROM static_visibility WHERE key = $1")
            .bind(VISIBILITY_KEY)
            .fetch_optional(pool)
            .await?;

    Ok(hidden.unwrap_or_default())
}

/// Adds `id` to the hidden set or removes it, in a single statement so
/// concurrent toggles of different ids cannot overwrite each other.
pub async fn toggle_hidden(pool: &PgPool, id: &str) -> Result<Vec<String>> {
    let hidden: Vec<String> = sqlx::query_scalar(
        r#"
        INSERT INTO static_visibility (key, hidden)
        VALUES ($1, ARRAY[$2::text])
        ON CONFLICT (key) DO UPDATE
        SET
            hidden = CASE
                WHEN $2::text = ANY(static_visibility.hidden)
                    THEN array_remove(static_visibility.hidden, $2::text)
                ELSE array_append(static_visibility.hidden, $2::text)
            END,
            updated_at = NOW()
        RETURNING hidden
        "#,
    )
    .bind(VISIBILITY_KEY)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(hidden)
}
