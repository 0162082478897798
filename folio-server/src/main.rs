use dotenvy::dotenv;

use folio_axum::{FOLIO_ADMIN_PREFIX, folio_router};

mod server;
use server::{ServerConfig, init_tracing, spawn_http_server, spawn_https_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenv().ok();
    init_tracing("folio_server");

    folio_axum::init().await?;

    let config = ServerConfig::from_env()?;
    let app = folio_router();
    tracing::info!("Admin console mounted at {}", FOLIO_ADMIN_PREFIX.as_str());

    let http_server = spawn_http_server(config.http_port, app.clone());
    match config.tls {
        Some(tls) => {
            let https_server = spawn_https_server(config.https_port, &tls, app).await?;
            tokio::try_join!(http_server, https_server)?;
        }
        None => {
            tracing::info!("FOLIO_TLS_CERT/FOLIO_TLS_KEY not set, serving HTTP only");
            http_server.await?;
        }
    }
    Ok(())
}
