use base64::{Engine, prelude::BASE64_STANDARD};
use plotters::prelude::*;
use plotters::style::FontTransform;
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

use crate::models::reading::HistorySeries;
use crate::models::time_range::TimeRange;

const SVG_MEDIA_TYPE: &str = "image/svg+xml";
// More labels than this overlap on the x axis.
const MAX_X_LABELS: usize = 24;
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("could not draw chart: {0}")]
    Drawing(String),
    #[error("chart rendering task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

/// A rendered chart, base64 encoded so it can be inlined into a page.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub media_type: &'static str,
    pub base64: String,
}

impl RenderedChart {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

pub fn chart_title(range: &TimeRange) -> String {
    format!("Temperature from {} to {}", range.start, range.end)
}

/// Draws the temperatures against their timestamps as a line with point
/// markers and returns the encoded image.
pub fn render_history_chart(
    series: &HistorySeries,
    range: &TimeRange,
    size: ChartSize,
) -> Result<RenderedChart, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (size.width, size.height)).into_drawing_area();
        draw_history(&root, series, &chart_title(range))
            .map_err(|err| ChartError::Drawing(err.to_string()))?;
        root.present()
            .map_err(|err| ChartError::Drawing(err.to_string()))?;
    }
    log::debug!(
        "Rendered chart of {} readings ({} bytes)",
        series.len(),
        svg.len()
    );
    Ok(RenderedChart {
        media_type: SVG_MEDIA_TYPE,
        base64: BASE64_STANDARD.encode(svg.as_bytes()),
    })
}

/// Renders on the blocking pool so request handling threads stay free.
pub async fn render_history_chart_blocking(
    series: HistorySeries,
    range: TimeRange,
    size: ChartSize,
) -> Result<RenderedChart, ChartError> {
    tokio::task::spawn_blocking(move || render_history_chart(&series, &range, size)).await?
}

fn draw_history(
    root: &DrawingArea<SVGBackend, plotters::coord::Shift>,
    series: &HistorySeries,
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    root.fill(&WHITE)?;

    let count = series.len() as u32;
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(140)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0u32..count).into_segmented(),
            temperature_bounds(&series.temperatures),
        )?;

    let label_for = |value: &SegmentValue<u32>| match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => series
            .timestamps
            .get(*i as usize)
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(series.len().min(MAX_X_LABELS))
        .x_label_formatter(&label_for)
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_desc("Time")
        .y_desc("Temperature")
        .draw()?;

    chart.draw_series(
        LineSeries::new(
            series
                .temperatures
                .iter()
                .enumerate()
                .map(|(i, temperature)| (SegmentValue::CenterOf(i as u32), *temperature)),
            LINE_COLOR.stroke_width(2),
        )
        .point_size(4),
    )?;

    Ok(())
}

/// Y axis range covering all temperatures with a bit of headroom.
fn temperature_bounds(temperatures: &[f64]) -> Range<f64> {
    let min = temperatures.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let padding = ((max - min) * 0.1).max(1.0);
    (min - padding)..(max + padding)
}
