use anyhow::Context;
use bhao_storage::{connect, DocumentStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod diagnostics;
mod extract;
mod metrics;
mod routes;
mod search;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    if cfg.frontend_url != "*" {
        warn!(
            frontend_url = %cfg.frontend_url,
            "FRONTEND_URL is set but CORS still allows every origin"
        );
    }

    let store: Option<Arc<dyn DocumentStore>> = match cfg.store_target() {
        Some((url, name)) => match connect(url, name) {
            Ok(s) => Some(Arc::new(s)),
            Err(e) => {
                warn!("document store unavailable ({}), serving without a database", e);
                None
            }
        },
        None => {
            info!("DATABASE_URL/DATABASE_NAME not set, serving without a database");
            None
        }
    };

    let app = routes::router(AppState::new(store, &cfg));
    info!("http listening on {}", cfg.bind_addr);
    match &cfg.tls {
        Some(tls) => {
            let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| format!("loading TLS material from {}", tls.cert.display()))?;
            axum_server::bind_rustls(cfg.bind_addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(cfg.bind_addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
