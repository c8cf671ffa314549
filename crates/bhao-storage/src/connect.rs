use crate::mem::InMemoryStore;
use bhao_core::{Result, StoreError};
use std::path::PathBuf;
use std::str::FromStr;

/// Where a database lives, parsed from `DATABASE_URL`.
///
/// `memory://` is a fresh empty store. `file://<dir>` (or a bare path) is a
/// directory holding one sub-directory per database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUrl {
    Memory,
    Dir(PathBuf),
}

impl FromStr for StoreUrl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreError::UnsupportedUrl("empty url".into()));
        }
        if s == "memory:" || s.starts_with("memory://") {
            return Ok(StoreUrl::Memory);
        }
        if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(StoreError::UnsupportedUrl(s.to_string()));
            }
            return Ok(StoreUrl::Dir(PathBuf::from(path)));
        }
        if s.contains("://") {
            return Err(StoreError::UnsupportedUrl(s.to_string()));
        }
        Ok(StoreUrl::Dir(PathBuf::from(s)))
    }
}

impl StoreUrl {
    pub fn database_dir(&self, database: &str) -> Option<PathBuf> {
        match self {
            StoreUrl::Memory => None,
            StoreUrl::Dir(base) => Some(base.join(database)),
        }
    }

    /// Opens `database`. With `create` the database directory is made if missing.
    pub fn open(&self, database: &str, create: bool) -> Result<InMemoryStore> {
        validate_database_name(database)?;
        match self.database_dir(database) {
            None => Ok(InMemoryStore::new()),
            Some(dir) => {
                if create {
                    std::fs::create_dir_all(&dir)?;
                }
                Ok(InMemoryStore::open_dir(dir)?)
            }
        }
    }
}

fn validate_database_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\'))
    {
        return Err(StoreError::UnsupportedUrl(format!(
            "bad database name {:?}",
            name
        )));
    }
    Ok(())
}

/// Opens an existing database for serving.
pub fn connect(url: &str, database: &str) -> Result<InMemoryStore> {
    let parsed: StoreUrl = url.parse()?;
    let store = parsed.open(database, false)?;
    tracing::info!(url = %url, database = %database, "document store opened");
    Ok(store)
}
