use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use ulid::Ulid;

/// Native identifier of a stored document.
///
/// Handlers never put this on the wire directly; see [`Document::into_transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Ulid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub body: Map<String, JsonValue>,
}

impl Document {
    /// Stamps `created_at`/`updated_at` onto `body` and assigns a fresh id.
    pub fn new_at(mut body: Map<String, JsonValue>, ts: DateTime<Utc>) -> Self {
        body.remove("_id");
        let stamp = JsonValue::String(ts.to_rfc3339());
        body.insert("created_at".into(), stamp.clone());
        body.insert("updated_at".into(), stamp);
        Self {
            id: DocumentId::new(),
            body,
        }
    }

    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.body.get(name)
    }

    /// Flattens the document into a JSON object whose `_id` is the string
    /// form of the native identifier.
    pub fn into_transport(self) -> Map<String, JsonValue> {
        let mut out = self.body;
        out.insert("_id".into(), JsonValue::String(self.id.to_string()));
        out
    }
}

/// Catalog entry as it is stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl Product {
    pub fn into_fields(self) -> Map<String, JsonValue> {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

pub const DEFAULT_SORT: &str = "value";

fn default_sort() -> Option<String> {
    Some(DEFAULT_SORT.to_string())
}

fn non_negative_price<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(de)? {
        Some(p) if !p.is_finite() || p < 0.0 => Err(D::Error::custom(format!(
            "price must be a non-negative number, got {}",
            p
        ))),
        other => Ok(other),
    }
}

/// Body of `POST /search`.
///
/// `sort` and `stores` are accepted for forward compatibility but do not
/// influence the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, alias = "query")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "non_negative_price")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "non_negative_price")]
    pub max_price: Option<f64>,
    #[serde(default = "default_sort")]
    pub sort: Option<String>,
    #[serde(default)]
    pub stores: Option<Vec<String>>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            q: Some(String::new()),
            min_price: None,
            max_price: None,
            sort: default_sort(),
            stores: None,
        }
    }
}

impl SearchRequest {
    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    /// Names of the accepted-but-inert fields this request actually sets.
    pub fn inert_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.sort.as_deref().is_some_and(|s| s != DEFAULT_SORT) {
            out.push("sort");
        }
        if self.stores.is_some() {
            out.push("stores");
        }
        out
    }
}
