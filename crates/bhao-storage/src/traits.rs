use bhao_core::{Document, DocumentId, FilterExpression, Result};
use serde_json::{Map, Value as JsonValue};

/// Document database as seen by the request handlers.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Names of every collection in the database, sorted.
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Documents in `collection` matching `filter`, in insertion order, at most `limit`.
    async fn find(
        &self,
        collection: &str,
        filter: &FilterExpression,
        limit: usize,
    ) -> Result<Vec<Document>>;

    /// Stores `body` with fresh timestamps and returns its new id.
    async fn insert(&self, collection: &str, body: Map<String, JsonValue>) -> Result<DocumentId>;
}
