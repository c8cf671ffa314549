use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `FRONTEND_URL`; informational only, CORS stays open to every origin.
    pub frontend_url: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("BIND_ADDR {:?} is not a socket address", bind))?;
        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together"),
        };
        Ok(Self {
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| "*".to_string()),
            database_url: get("DATABASE_URL"),
            database_name: get("DATABASE_NAME"),
            bind_addr,
            tls,
        })
    }

    /// Both connection settings, when usable for opening a store.
    pub fn store_target(&self) -> Option<(&str, &str)> {
        match (self.database_url.as_deref(), self.database_name.as_deref()) {
            (Some(url), Some(name)) if !url.trim().is_empty() && !name.trim().is_empty() => {
                Some((url, name))
            }
            _ => None,
        }
    }
}
