use crate::metrics::{SEARCH_REQUESTS_TOTAL, SEARCH_RESULTS_RETURNED};
use bhao_core::{build_filter, Document, SearchRequest, StoreError, PRODUCT_COLLECTION, SEARCH_LIMIT};
use bhao_storage::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

/// `{"items": [...]}`; each item is a stored product with a string `_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<Map<String, JsonValue>>,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found(Vec<Document>),
    NoStore,
    Failed(StoreError),
}

impl SearchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::NoStore => "no_store",
            SearchOutcome::Failed(_) => "failed",
        }
    }

    /// Degrades every non-`Found` outcome to an empty list.
    pub fn into_envelope(self) -> SearchResponse {
        let docs = match self {
            SearchOutcome::Found(docs) => docs,
            SearchOutcome::NoStore | SearchOutcome::Failed(_) => Vec::new(),
        };
        SearchResponse {
            items: docs.into_iter().map(Document::into_transport).collect(),
        }
    }
}

pub async fn run_search(store: Option<&dyn DocumentStore>, req: &SearchRequest) -> SearchOutcome {
    let filter = build_filter(req);
    let inert = req.inert_fields();
    if !inert.is_empty() {
        debug!(fields = ?inert, "sort/stores are accepted but not applied");
    }
    let outcome = match store {
        None => SearchOutcome::NoStore,
        Some(store) => match store.find(PRODUCT_COLLECTION, &filter, SEARCH_LIMIT).await {
            Ok(docs) => SearchOutcome::Found(docs),
            Err(e) => {
                warn!(filter = %filter.to_json(), "product search failed, answering empty: {}", e);
                SearchOutcome::Failed(e)
            }
        },
    };
    SEARCH_REQUESTS_TOTAL
        .with_label_values(&[outcome.label()])
        .inc();
    if let SearchOutcome::Found(docs) = &outcome {
        SEARCH_RESULTS_RETURNED.observe(docs.len() as f64);
    }
    outcome
}
