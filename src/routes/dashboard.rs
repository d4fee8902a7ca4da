use askama::Template;
use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json, Router, routing::get};

use crate::app::AppState;
use crate::dashboard::{Dashboard, build_dashboard};
use crate::error::InternalError;
use crate::models::time_range::RangeForm;
use crate::routes::index::render_main;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_dashboard).post(show_dashboard))
        .route("/api/dashboard", get(get_dashboard_json))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    dashboard: &'a Dashboard,
    chart_uri: Option<String>,
}

async fn load_dashboard(state: &AppState, form: RangeForm) -> Dashboard {
    build_dashboard(
        state.source.as_ref(),
        form.resolve(),
        state.config.chart_size(),
    )
    .await
}

// Serves both the initial GET and the range form POST. A request without a
// readable form shows the whole history.
async fn show_dashboard(
    headers: HeaderMap,
    State(state): State<AppState>,
    form: Result<Form<RangeForm>, FormRejection>,
) -> Result<Response, InternalError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            log::debug!("No usable range form ({}), showing all history", rejection);
            RangeForm::default()
        }
    };
    let dashboard = load_dashboard(&state, form).await;
    let content = DashboardTemplate {
        dashboard: &dashboard,
        chart_uri: dashboard.chart.as_ref().map(|chart| chart.data_uri()),
    }
    .render()?;
    let content = if headers.get("hx-request").is_some() {
        content
    } else {
        render_main(content)?
    };
    Ok(Html(content).into_response())
}

async fn get_dashboard_json(
    State(state): State<AppState>,
    Query(form): Query<RangeForm>,
) -> Json<Dashboard> {
    Json(load_dashboard(&state, form).await)
}
