use crate::matcher::CompiledFilter;
use crate::snapshot;
use crate::traits::DocumentStore;
use bhao_core::{Document, DocumentId, FilterExpression, Result, StoreError};
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus::{register_histogram_vec, HistogramVec};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

static FIND_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("store_find_seconds", "Filtered scan latency", &["collection"])
        .unwrap()
});

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // collection -> documents in insertion order
    collections: BTreeMap<String, Vec<Document>>,
    // set when the store was opened from a database directory
    data_dir: Option<PathBuf>,
    // collections whose file had unreadable lines: file path, skipped count
    partial: BTreeMap<String, (PathBuf, usize)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every collection file found in an existing database directory.
    pub fn open_dir(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database directory {} does not exist", dir.display()),
            ));
        }
        let mut collections = BTreeMap::new();
        let mut partial = BTreeMap::new();
        for (name, path) in snapshot::list_collection_files(&dir)? {
            let loaded = snapshot::read_collection(&path)?;
            tracing::debug!(
                collection = %name,
                documents = loaded.docs.len(),
                skipped = loaded.skipped,
                "loaded collection"
            );
            if loaded.skipped > 0 {
                partial.insert(name.clone(), (path, loaded.skipped));
            }
            collections.insert(name, loaded.docs);
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                collections,
                data_dir: Some(dir),
                partial,
            })),
        })
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.inner.read().data_dir.clone()
    }

    /// Replays an already-identified document, keeping its id and timestamps.
    pub fn replay_insert(&self, collection: &str, doc: Document) {
        self.inner
            .write()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .read()
            .collections
            .get(collection)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    /// Writes `collection` back to its file in the database directory.
    ///
    /// Refuses with [`StoreError::Corrupt`] when the file had lines that could
    /// not be loaded, since rewriting it would drop them.
    pub fn flush_collection(&self, collection: &str) -> Result<usize> {
        let (dir, docs) = {
            let inner = self.inner.read();
            let dir = inner
                .data_dir
                .clone()
                .ok_or_else(|| StoreError::Unavailable("store has no database directory".into()))?;
            if let Some((path, skipped)) = inner.partial.get(collection) {
                return Err(StoreError::Corrupt {
                    path: path.display().to_string(),
                    reason: format!("{} unreadable line(s) would be lost on rewrite", skipped),
                });
            }
            let docs = inner
                .collections
                .get(collection)
                .cloned()
                .unwrap_or_default();
            (dir, docs)
        };
        Ok(snapshot::write_collection(
            snapshot::collection_path(&dir, collection),
            &docs,
        )?)
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.read().collections.keys().cloned().collect())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &FilterExpression,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let compiled = CompiledFilter::compile(filter)?;
        let _timer = FIND_SECONDS
            .with_label_values(&[collection])
            .start_timer();
        let inner = self.inner.read();
        let Some(docs) = inner.collections.get(collection) else {
            return Ok(vec![]);
        };
        Ok(docs
            .iter()
            .filter(|d| compiled.matches(d))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, collection: &str, body: Map<String, JsonValue>) -> Result<DocumentId> {
        if collection.is_empty() || collection.contains(|c: char| matches!(c, '/' | '\\' | '.')) {
            return Err(StoreError::InvalidDocument(format!(
                "bad collection name {:?}",
                collection
            )));
        }
        let doc = Document::new_at(body, Utc::now());
        let id = doc.id;
        self.replay_insert(collection, doc);
        Ok(id)
    }
}
