use bhao_core::{Constraint, Document, FilterExpression, Result, StoreError};
use regex::{Regex, RegexBuilder};
use serde_json::Value as JsonValue;

enum Check {
    Equals(JsonValue),
    Pattern(Regex),
    Range { gte: Option<f64>, lte: Option<f64> },
}

/// A filter with its patterns compiled, evaluated once per candidate document.
pub struct CompiledFilter {
    checks: Vec<(String, Check)>,
}

impl CompiledFilter {
    pub fn compile(filter: &FilterExpression) -> Result<Self> {
        let mut checks = Vec::new();
        for (field, c) in filter.iter() {
            let check = match c {
                Constraint::Equals(v) => Check::Equals(v.clone()),
                Constraint::Pattern {
                    pattern,
                    case_insensitive,
                } => {
                    let re = RegexBuilder::new(pattern)
                        .case_insensitive(*case_insensitive)
                        .build()
                        .map_err(|e| StoreError::InvalidFilter(format!("{}: {}", field, e)))?;
                    Check::Pattern(re)
                }
                Constraint::Range { gte, lte } => Check::Range {
                    gte: *gte,
                    lte: *lte,
                },
            };
            checks.push((field.clone(), check));
        }
        Ok(Self { checks })
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.checks.iter().all(|(field, check)| {
            let Some(val) = doc.field(field) else {
                return false;
            };
            match check {
                Check::Equals(want) => json_eq(val, want),
                Check::Pattern(re) => val.as_str().map(|s| re.is_match(s)).unwrap_or(false),
                Check::Range { gte, lte } => match val.as_f64() {
                    Some(n) => gte.map_or(true, |g| n >= g) && lte.map_or(true, |l| n <= l),
                    None => false,
                },
            }
        })
    }
}

// 100 and 100.0 are different serde_json numbers but the same price.
fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhao_core::{build_filter, SearchRequest};
    use chrono::Utc;
    use serde_json::json;

    fn doc(v: JsonValue) -> Document {
        match v {
            JsonValue::Object(map) => Document::new_at(map, Utc::now()),
            _ => unreachable!(),
        }
    }

    fn compiled(req: SearchRequest) -> CompiledFilter {
        CompiledFilter::compile(&build_filter(&req)).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = compiled(SearchRequest::default());
        assert!(f.matches(&doc(json!({}))));
        assert!(f.matches(&doc(json!({"title": "anything", "price": 1}))));
    }

    #[test]
    fn title_pattern_is_case_insensitive_substring() {
        let f = compiled(SearchRequest {
            q: Some("phone".into()),
            ..Default::default()
        });
        assert!(f.matches(&doc(json!({"title": "Smartphone X"}))));
        assert!(f.matches(&doc(json!({"title": "HEADPHONES"}))));
        assert!(!f.matches(&doc(json!({"title": "Laptop"}))));
        assert!(!f.matches(&doc(json!({"price": 10}))));
        assert!(!f.matches(&doc(json!({"title": 7}))));
    }

    #[test]
    fn price_range_is_inclusive() {
        let f = compiled(SearchRequest {
            min_price: Some(100.0),
            max_price: Some(500.0),
            ..Default::default()
        });
        let at = |p: JsonValue| f.matches(&doc(json!({"title": "x", "price": p})));
        assert!(!at(json!(99)));
        assert!(at(json!(100)));
        assert!(at(json!(250.5)));
        assert!(at(json!(500)));
        assert!(!at(json!(501)));
        assert!(!at(json!("300")));
    }

    #[test]
    fn open_range_bounds() {
        let f = compiled(SearchRequest {
            min_price: Some(100.0),
            ..Default::default()
        });
        assert!(f.matches(&doc(json!({"price": 1_000_000}))));
        assert!(!f.matches(&doc(json!({"price": 99.99}))));
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let f = compiled(SearchRequest {
            min_price: Some(500.0),
            max_price: Some(100.0),
            ..Default::default()
        });
        for p in [50, 100, 300, 500, 900] {
            assert!(!f.matches(&doc(json!({"price": p}))));
        }
    }

    #[test]
    fn equals_compares_numbers_by_value() {
        let mut filter = FilterExpression::default();
        filter.insert("store", Constraint::Equals(json!("daraz")));
        filter.insert("price", Constraint::Equals(json!(100)));
        let f = CompiledFilter::compile(&filter).unwrap();
        assert!(f.matches(&doc(json!({"store": "daraz", "price": 100.0}))));
        assert!(!f.matches(&doc(json!({"store": "Daraz", "price": 100}))));
    }

    #[test]
    fn invalid_pattern_fails_to_compile() {
        let filter = build_filter(&SearchRequest {
            q: Some("(unclosed".into()),
            ..Default::default()
        });
        match CompiledFilter::compile(&filter) {
            Err(StoreError::InvalidFilter(msg)) => assert!(msg.starts_with("title")),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("pattern should not compile"),
        }
    }
}
