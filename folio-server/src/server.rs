use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_HTTP_PORT: u16 = 3001;
const DEFAULT_HTTPS_PORT: u16 = 3443;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TlsFiles {
    pub(crate) cert: String,
    pub(crate) key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ServerConfig {
    pub(crate) http_port: u16,
    pub(crate) https_port: u16,
    /// HTTPS is served only when both the certificate and the key are configured
    pub(crate) tls: Option<TlsFiles>,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let port = |name: &str, default: u16| -> Result<u16, String> {
            match lookup(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|e| format!("Invalid {name} {value:?}: {e}")),
                None => Ok(default),
            }
        };

        let tls = match (lookup("FOLIO_TLS_CERT"), lookup("FOLIO_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
            (None, None) => None,
            _ => return Err("FOLIO_TLS_CERT and FOLIO_TLS_KEY must be set together".to_string()),
        };

        Ok(Self {
            http_port: port("PORT", DEFAULT_HTTP_PORT)?,
            https_port: port("HTTPS_PORT", DEFAULT_HTTPS_PORT)?,
            tls,
        })
    }
}

pub(crate) fn spawn_http_server(port: u16, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("HTTP server listening on {}", addr);
        if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
            tracing::error!("HTTP server on {} stopped: {}", addr, e);
        }
    })
}

pub(crate) async fn spawn_https_server(
    port: u16,
    tls: &TlsFiles,
    app: Router,
) -> Result<JoinHandle<()>, std::io::Error> {
    let config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTPS server listening on {}", addr);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTPS server on {} stopped: {}", addr, e);
        }
    }))
}

pub(crate) fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("folio=debug,folio_axum=debug,{app_name}=debug,info").into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(debug_assertions)]
    tracing::info!("Debug build: detailed logging for {} by default", app_name);
    tracing::info!("Set RUST_LOG to change verbosity, e.g. RUST_LOG=folio=trace,info");
}
