use crate::metrics::DIAGNOSTIC_LIST_FAILURES_TOTAL;
use bhao_storage::DocumentStore;
use serde::{Deserialize, Serialize};

pub const NOT_SET: &str = "not set";

/// Body of `GET /test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbStatus {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

/// Reports connectivity. A failed collection listing leaves `collections`
/// empty and keeps `connection_status` at "connected".
pub async fn diagnose(
    store: Option<&dyn DocumentStore>,
    database_url: Option<&str>,
    database_name: Option<&str>,
) -> DbStatus {
    let mut status = DbStatus {
        backend: "ok".into(),
        database: "not-configured".into(),
        database_url: database_url.unwrap_or(NOT_SET).to_string(),
        database_name: database_name.unwrap_or(NOT_SET).to_string(),
        connection_status: "disconnected".into(),
        collections: Vec::new(),
    };
    if let Some(store) = store {
        status.database = "ok".into();
        status.connection_status = "connected".into();
        match store.list_collection_names().await {
            Ok(names) => status.collections = names,
            Err(e) => {
                DIAGNOSTIC_LIST_FAILURES_TOTAL.inc();
                tracing::warn!("listing collections failed: {}", e);
            }
        }
    }
    status
}
