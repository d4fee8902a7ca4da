use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::DashboardConfig;
use crate::routes::dashboard;
use crate::upstream::{HttpTemperatureSource, TemperatureSource, UpstreamResult};

// Anything that goes in here must be a handle or pointer that can be cloned.
// The underlying state itself should be shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub source: Arc<dyn TemperatureSource>,
}

impl AppState {
    pub fn from_config(config: DashboardConfig) -> UpstreamResult<AppState> {
        log::info!(
            "Using temperature service at {} (timeout {}s)",
            config.upstream_url,
            config.timeout_secs
        );
        let source = HttpTemperatureSource::new(&config.upstream_url, config.timeout())?;
        Ok(AppState {
            config: Arc::new(config),
            source: Arc::new(source),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let assets_path = state.config.assets_path.clone();
    let mut app = dashboard::routes(state).layer(TraceLayer::new_for_http());

    log::debug!("serving assets from {}", assets_path);
    let assets_service = ServeDir::new(assets_path);
    app = app.fallback_service(assets_service);
    app
}
