use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `id` field as it was written by whichever schema revision created the
/// document: a sequential integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyId {
    Number(i64),
    Text(String),
}

impl LegacyId {
    /// Value this id contributes to the sequential counter.
    pub fn counter_value(&self) -> i64 {
        match self {
            LegacyId::Number(n) => *n,
            LegacyId::Text(s) => text_counter_value(s),
        }
    }
}

/// Text ids count only when they are an optional `-` followed by ASCII digits
/// and fit in an `i64`; anything else (signs, padding, overflow) counts as 0.
/// `product_queries::insert_with_next_id` applies the same rule in SQL.
pub fn text_counter_value(s: &str) -> i64 {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    s.parse().unwrap_or(0)
}

impl std::fmt::Display for LegacyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegacyId::Number(n) => write!(f, "{}", n),
            LegacyId::Text(s) => f.write_str(s),
        }
    }
}

/// Persisted product document. Everything the store does not interpret is
/// kept in `extra` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LegacyId>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specs: Vec<Value>,
    #[serde(default)]
    pub translations: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A document together with the identifier the storage layer assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub native_id: String,
    pub doc: ProductDocument,
}

impl StoredProduct {
    pub fn into_product(self) -> Product {
        let id = match self.doc.id {
            Some(id) => id.to_string(),
            None => self.native_id,
        };

        Product {
            id,
            images: self.doc.images,
            specs: self.doc.specs,
            translations: self.doc.translations,
            created_at: self.doc.created_at,
            updated_at: self.doc.updated_at,
            extra: self.doc.extra,
        }
    }
}

/// Product as served over HTTP, with `id` normalized to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub images: Vec<String>,
    pub specs: Vec<Value>,
    pub translations: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub images: Vec<String>,
    pub specs: Vec<Value>,
    pub translations: Map<String, Value>,
    pub extra: Map<String, Value>,
}

/// Shallow patch: a present field replaces the stored value wholesale.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub images: Option<Vec<String>>,
    pub specs: Option<Vec<Value>>,
    pub translations: Option<Map<String, Value>>,
    pub extra: Map<String, Value>,
}

/// Keys owned by the store; pass-through fields may not shadow them.
pub const RESERVED_FIELDS: &[&str] = &[
    "_id",
    "id",
    "images",
    "specs",
    "translations",
    "createdAt",
    "updatedAt",
];

impl ProductDocument {
    pub fn new(id: i64, input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Some(LegacyId::Number(id)),
            images: input.images,
            specs: input.specs,
            translations: input.translations,
            created_at: Some(now),
            updated_at: Some(now),
            extra: strip_reserved(input.extra),
        }
    }

    pub fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(specs) = patch.specs {
            self.specs = specs;
        }
        if let Some(translations) = patch.translations {
            self.translations = translations;
        }
        for (key, value) in strip_reserved(patch.extra) {
            self.extra.insert(key, value);
        }
        self.updated_at = Some(now);
    }
}

impl ProductPatch {
    /// The patch as a top-level JSON object, suitable for a shallow
    /// `doc || patch` merge.
    pub fn to_document_patch(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut patch = strip_reserved(self.extra.clone());
        if let Some(images) = &self.images {
            patch.insert("images".to_string(), Value::from(images.clone()));
        }
        if let Some(specs) = &self.specs {
            patch.insert("specs".to_string(), Value::Array(specs.clone()));
        }
        if let Some(translations) = &self.translations {
            patch.insert(
                "translations".to_string(),
                Value::Object(translations.clone()),
            );
        }
        patch.insert("updatedAt".to_string(), Value::String(now.to_rfc3339()));
        patch
    }
}

fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    fields.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_documents_deserialize_with_either_id_form() {
        let numeric: ProductDocument =
            serde_json::from_value(json!({"id": 4, "images": ["a.jpg"], "name": "Lamp"}))
                .unwrap();
        assert_eq!(numeric.id, Some(LegacyId::Number(4)));
        assert_eq!(numeric.extra["name"], "Lamp");

        let text: ProductDocument = serde_json::from_value(json!({"id": "12"})).unwrap();
        assert_eq!(text.id, Some(LegacyId::Text("12".to_string())));
        assert_eq!(text.id.map(|id| id.counter_value()), Some(12));

        let none: ProductDocument = serde_json::from_value(json!({"name": "Chair"})).unwrap();
        assert_eq!(none.id, None);
        assert!(none.images.is_empty());
    }

    #[test]
    fn product_without_id_is_exposed_by_native_id() {
        let stored = StoredProduct {
            native_id: "65f1c0ffee0000000000abcd".to_string(),
            doc: serde_json::from_value(json!({"name": "Chair"})).unwrap(),
        };
        assert_eq!(stored.into_product().id, "65f1c0ffee0000000000abcd");
    }

    #[test]
    fn patch_replaces_nested_fields_wholesale() {
        let now = Utc::now();
        let mut input = ProductInput::default();
        input.images = vec!["a.jpg".to_string()];
        input.translations.insert("en".to_string(), json!("Red"));
        input.translations.insert("fr".to_string(), json!("Rouge"));
        let mut doc = ProductDocument::new(1, input, now);

        let mut translations = Map::new();
        translations.insert("de".to_string(), json!("Rot"));
        doc.apply(
            ProductPatch {
                translations: Some(translations),
                ..Default::default()
            },
            now,
        );

        assert_eq!(doc.translations.len(), 1);
        assert_eq!(doc.translations["de"], "Rot");
        assert_eq!(doc.images, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn pass_through_fields_cannot_overwrite_store_fields() {
        let now = Utc::now();
        let mut extra = Map::new();
        extra.insert("id".to_string(), json!("hijack"));
        extra.insert("createdAt".to_string(), json!("1999-01-01T00:00:00Z"));
        extra.insert("published".to_string(), json!(true));

        let doc = ProductDocument::new(
            3,
            ProductInput {
                extra,
                ..Default::default()
            },
            now,
        );

        assert_eq!(doc.id, Some(LegacyId::Number(3)));
        assert_eq!(doc.created_at, Some(now));
        assert_eq!(doc.extra.len(), 1);
        assert_eq!(doc.extra["published"], true);
    }

    #[test]
    fn only_plain_integer_text_counts_toward_the_counter() {
        assert_eq!(text_counter_value("41"), 41);
        assert_eq!(text_counter_value("-3"), -3);
        assert_eq!(text_counter_value("9223372036854775807"), i64::MAX);

        assert_eq!(text_counter_value("+50"), 0);
        assert_eq!(text_counter_value(" 7 "), 0);
        assert_eq!(text_counter_value("9223372036854775808"), 0);
        assert_eq!(text_counter_value("-"), 0);
        assert_eq!(text_counter_value("sku-12"), 0);
        assert_eq!(text_counter_value(""), 0);
    }
}
