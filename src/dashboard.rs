use serde::Serialize;

use crate::chart::{ChartSize, RenderedChart, render_history_chart_blocking};
use crate::models::reading::{HistorySeries, Reading};
use crate::models::time_range::TimeRange;
use crate::upstream::{TemperatureSource, UpstreamError};

pub const LATEST_TEMPERATURE_UNAVAILABLE: &str = "Failed to fetch the latest temperature";
pub const LATEST_TIMESTAMP_UNAVAILABLE: &str = "Failed to fetch the timestamp";
pub const AVERAGE_UNAVAILABLE: &str = "No data available";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Latest {
    Available(Reading),
    Unavailable,
}

impl Latest {
    pub fn temperature_text(&self) -> String {
        match self {
            Latest::Available(reading) => reading.temperature.to_string(),
            Latest::Unavailable => LATEST_TEMPERATURE_UNAVAILABLE.to_string(),
        }
    }

    pub fn timestamp_text(&self) -> String {
        match self {
            Latest::Available(reading) => reading.timestamp.clone(),
            Latest::Unavailable => LATEST_TIMESTAMP_UNAVAILABLE.to_string(),
        }
    }
}

/// Everything one dashboard page shows. Upstream failures leave their part
/// degraded instead of failing the page.
#[derive(Serialize, Debug, Clone)]
pub struct Dashboard {
    pub range: TimeRange,
    pub latest: Latest,
    pub average_temperature: Option<f64>,
    pub history: Vec<Reading>,
    pub series: HistorySeries,
    pub chart: Option<RenderedChart>,
}

impl Dashboard {
    pub fn average_text(&self) -> String {
        match self.average_temperature {
            Some(average) => format!("{average:.2}"),
            None => AVERAGE_UNAVAILABLE.to_string(),
        }
    }
}

fn log_unavailable(what: &str, err: &UpstreamError) {
    match err {
        UpstreamError::Status(status) => {
            log::warn!("{} unavailable: service answered {}", what, status)
        }
        UpstreamError::Transport { source } if source.is_timeout() => {
            log::warn!("{} unavailable: request timed out", what)
        }
        err => log::warn!("{} unavailable: {}", what, err),
    }
}

pub async fn build_dashboard(
    source: &dyn TemperatureSource,
    range: TimeRange,
    chart_size: ChartSize,
) -> Dashboard {
    let (latest, history, stats) =
        tokio::join!(source.latest(), source.history(&range), source.stats());

    let latest = match latest {
        Ok(reading) => Latest::Available(reading),
        Err(err) => {
            log_unavailable("Latest temperature", &err);
            Latest::Unavailable
        }
    };

    let average_temperature = match stats {
        Ok(stats) => stats.average_temperature,
        Err(err) => {
            log_unavailable("Daily average", &err);
            None
        }
    };

    let history = match history {
        Ok(history) => history,
        Err(err) => {
            log_unavailable("History", &err);
            Vec::new()
        }
    };
    let series = HistorySeries::from_readings(&history);

    // No readings means no chart, whether the history failed or was empty.
    let chart = if series.is_empty() {
        None
    } else {
        match render_history_chart_blocking(series.clone(), range.clone(), chart_size).await {
            Ok(chart) => Some(chart),
            Err(err) => {
                log::error!("Failed to render history chart: {}", err);
                None
            }
        }
    };

    Dashboard {
        range,
        latest,
        average_temperature,
        history,
        series,
        chart,
    }
}
