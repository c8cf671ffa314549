use crate::model::SearchRequest;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

pub const PRODUCT_COLLECTION: &str = "product";
pub const SEARCH_LIMIT: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Field equals the given JSON value.
    Equals(JsonValue),
    /// Field is a string matched by `pattern` (regex syntax).
    Pattern {
        pattern: String,
        case_insensitive: bool,
    },
    /// Field is a number within the inclusive bounds; a missing bound is open.
    Range { gte: Option<f64>, lte: Option<f64> },
}

/// Field name -> constraint. All constraints must hold for a document to match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpression(pub BTreeMap<String, Constraint>);

impl FilterExpression {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Constraint> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, c: Constraint) {
        self.0.insert(field.into(), c);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Constraint)> {
        self.0.iter()
    }

    /// Document-database style rendering, used for logs and the CLI.
    pub fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        for (field, c) in self.0.iter() {
            let v = match c {
                Constraint::Equals(v) => v.clone(),
                Constraint::Pattern {
                    pattern,
                    case_insensitive,
                } => {
                    if *case_insensitive {
                        json!({"$regex": pattern, "$options": "i"})
                    } else {
                        json!({"$regex": pattern})
                    }
                }
                Constraint::Range { gte, lte } => {
                    let mut r = Map::new();
                    if let Some(g) = gte {
                        r.insert("$gte".into(), json!(g));
                    }
                    if let Some(l) = lte {
                        r.insert("$lte".into(), json!(l));
                    }
                    JsonValue::Object(r)
                }
            };
            out.insert(field.clone(), v);
        }
        JsonValue::Object(out)
    }
}

/// Translates a search request into a store filter.
///
/// `sort` and `stores` never produce constraints.
pub fn build_filter(req: &SearchRequest) -> FilterExpression {
    let mut filter = FilterExpression::default();
    let q = req.query();
    if !q.is_empty() {
        filter.insert(
            "title",
            Constraint::Pattern {
                pattern: q.to_string(),
                case_insensitive: true,
            },
        );
    }
    if req.min_price.is_some() || req.max_price.is_some() {
        filter.insert(
            "price",
            Constraint::Range {
                gte: req.min_price,
                lte: req.max_price,
            },
        );
    }
    filter
}
