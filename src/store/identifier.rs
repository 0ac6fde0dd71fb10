//! Product identifier resolution.
//!
//! Documents written by different schema revisions carry their `id` as an
//! integer, as a string, or not at all (relying on the storage-assigned
//! native id). A caller-supplied id is expanded into an ordered list of
//! lookups; stores try them in order and the first hit wins.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{LegacyId, StoredProduct};

pub const NATIVE_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// `id` stored as an integer.
    Numeric(i64),
    /// `id` stored as a string, compared exactly.
    Text(String),
    /// Storage-assigned identifier.
    Native(String),
}

impl Lookup {
    pub fn matches(&self, product: &StoredProduct) -> bool {
        match (self, &product.doc.id) {
            (Lookup::Numeric(n), Some(LegacyId::Number(id))) => id == n,
            (Lookup::Text(s), Some(LegacyId::Text(id))) => id == s,
            (Lookup::Native(s), _) => &product.native_id == s,
            _ => false,
        }
    }
}

/// Expands `raw` into lookups in precedence order: integer form, exact text,
/// then native id when `raw` has the native shape.
pub fn resolve_identifier(raw: &str) -> Vec<Lookup> {
    let mut lookups = Vec::with_capacity(3);

    if let Ok(n) = raw.trim().parse::<i64>() {
        lookups.push(Lookup::Numeric(n));
    }

    lookups.push(Lookup::Text(raw.to_string()));

    if is_native_id(raw) {
        lookups.push(Lookup::Native(raw.to_ascii_lowercase()));
    }

    lookups
}

pub fn is_native_id(raw: &str) -> bool {
    raw.len() == NATIVE_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// 24 lowercase hex characters: a 4-byte big-endian timestamp followed by 8
/// random bytes.
pub fn generate_native_id() -> String {
    let seconds = Utc::now().timestamp() as u32;
    let random = Uuid::new_v4();

    let mut id = format!("{:08x}", seconds);
    for byte in &random.as_bytes()[..8] {
        id.push_str(&format!("{:02x}", byte));
    }
    id
}

/// First product matched by the lookups of `raw`, honouring precedence.
pub fn find_in<'a>(products: &'a [StoredProduct], raw: &str) -> Option<&'a StoredProduct> {
    resolve_identifier(raw)
        .iter()
        .find_map(|lookup| products.iter().find(|p| lookup.matches(p)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductDocument;
    use serde_json::json;

    fn stored(native_id: &str, doc: serde_json::Value) -> StoredProduct {
        StoredProduct {
            native_id: native_id.to_string(),
            doc: serde_json::from_value::<ProductDocument>(doc).unwrap(),
        }
    }

    #[test]
    fn integer_text_yields_numeric_then_text() {
        assert_eq!(
            resolve_identifier("42"),
            vec![Lookup::Numeric(42), Lookup::Text("42".to_string())]
        );
    }

    #[test]
    fn plain_text_yields_text_only() {
        assert_eq!(
            resolve_identifier("static-lamp"),
            vec![Lookup::Text("static-lamp".to_string())]
        );
    }

    #[test]
    fn native_shaped_text_adds_native_lookup_last() {
        let raw = "65F1C0FFEE0000000000ABCD";
        assert_eq!(
            resolve_identifier(raw),
            vec![
                Lookup::Text(raw.to_string()),
                Lookup::Native(raw.to_ascii_lowercase()),
            ]
        );
    }

    #[test]
    fn generated_native_ids_have_native_shape() {
        let a = generate_native_id();
        let b = generate_native_id();
        assert!(is_native_id(&a));
        assert!(is_native_id(&b));
        assert_ne!(a, b);
        assert!(!is_native_id("12345"));
        assert!(!is_native_id("zz1c0ffee0000000000abcd0"));
    }

    #[test]
    fn numeric_form_wins_over_text_form() {
        let products = vec![
            stored("aaaaaaaaaaaaaaaaaaaaaaaa", json!({"id": "7", "name": "text"})),
            stored("bbbbbbbbbbbbbbbbbbbbbbbb", json!({"id": 7, "name": "number"})),
        ];
        let found = find_in(&products, "7").unwrap();
        assert_eq!(found.doc.extra["name"], "number");
    }

    #[test]
    fn each_representation_resolves() {
        let products = vec![
            stored("aaaaaaaaaaaaaaaaaaaaaaaa", json!({"id": 3})),
            stored("bbbbbbbbbbbbbbbbbbbbbbbb", json!({"id": "legacy-9"})),
            stored("cccccccccccccccccccccccc", json!({"name": "no id"})),
        ];

        assert_eq!(
            find_in(&products, "3").map(|p| p.native_id.as_str()),
            Some("aaaaaaaaaaaaaaaaaaaaaaaa")
        );
        assert_eq!(
            find_in(&products, "legacy-9").map(|p| p.native_id.as_str()),
            Some("bbbbbbbbbbbbbbbbbbbbbbbb")
        );
        assert_eq!(
            find_in(&products, "cccccccccccccccccccccccc").map(|p| p.native_id.as_str()),
            Some("cccccccccccccccccccccccc")
        );
        // A numeric record is also reachable through its native id.
        assert_eq!(
            find_in(&products, "aaaaaaaaaaaaaaaaaaaaaaaa").map(|p| p.doc.id.clone()),
            Some(Some(LegacyId::Number(3)))
        );
        assert!(find_in(&products, "404").is_none());
    }
}
