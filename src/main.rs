use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use app::{AppState, create_app};
use config::{ConfigOverrides, DashboardConfig};

mod app;
mod chart;
mod config;
mod dashboard;
mod error;
mod models;
mod routes;
mod upstream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with dashboard settings.
    #[arg(long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the temperature service.
    #[arg(short, long, env = "TEMPERATURE_SERVER_URL")]
    upstream_url: Option<String>,

    #[arg(short, long, env = "LISTEN_ADDRESS")]
    listen_address: Option<SocketAddr>,

    /// Timeout for each request to the temperature service.
    #[arg(short, long, env = "UPSTREAM_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[arg(short, long, env = "KEY_FILE_PATH", requires = "cert_file_path")]
    key_file_path: Option<String>,

    #[arg(short, long, env = "CERT_FILE_PATH")]
    cert_file_path: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();

    let config = DashboardConfig::load(
        args.config.as_deref(),
        ConfigOverrides {
            upstream_url: args.upstream_url,
            listen_address: args.listen_address,
            timeout_secs: args.timeout_secs,
        },
    )
    .expect("failed to load configuration");
    let addr = config.listen_address;

    let state = AppState::from_config(config).expect("failed to create temperature client");
    let app = create_app(state);

    log::info!("listening on {}", addr);
    if let (Some(key_file_path), Some(cert_file_path)) = (args.key_file_path, args.cert_file_path)
    {
        log::info!(
            "using tls with key file {} and cert file {}",
            key_file_path,
            cert_file_path
        );
        let tls = RustlsConfig::from_pem_file(cert_file_path, key_file_path)
            .await
            .expect("failed to read tls key and certificate");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await
            .expect("server failed");
    } else {
        axum_server::bind(addr)
            .serve(app.into_make_service())
            .await
            .expect("server failed");
    }
}
