//! Stand-in for the temperature service. Serves generated readings over the
//! same HTTP interface so the dashboard can be run without a thermometer.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use chrono::{Duration, Local, NaiveDateTime};
use clap::Parser;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MEAN_TEMPERATURE: f64 = 21.0;
const DAILY_SWING: f64 = 3.0;
const NOISE: f64 = 0.3;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    address: SocketAddr,

    /// How many days of readings to generate, ending now.
    #[arg(short, long, default_value_t = 3)]
    days: u32,

    #[arg(short, long, default_value_t = 10)]
    interval_minutes: u32,

    /// Answer /temperature with 500.
    #[arg(long)]
    fail_latest: bool,

    /// Answer /history with 500.
    #[arg(long)]
    fail_history: bool,

    /// Answer /stats with 500.
    #[arg(long)]
    fail_stats: bool,
}

#[derive(Serialize, Clone, Debug)]
struct Reading {
    timestamp: String,
    temperature: f64,
}

struct FakeThermometer {
    // Oldest first, like rows in insertion order.
    readings: Vec<(NaiveDateTime, f64)>,
    fail_latest: bool,
    fail_history: bool,
    fail_stats: bool,
}

type FakeThermometerHandle = Arc<FakeThermometer>;

#[derive(Deserialize)]
struct HistoryQuery {
    start_datetime: Option<String>,
    end_datetime: Option<String>,
}

fn generate_readings(end: NaiveDateTime, days: u32, interval_minutes: u32) -> Vec<(NaiveDateTime, f64)> {
    let mut rng = rand::rng();
    let count = days * 24 * 60 / interval_minutes.max(1);
    (0..count)
        .rev()
        .map(|i| {
            let time = end - Duration::minutes(i64::from(i * interval_minutes));
            let hours = time.and_utc().timestamp() as f64 / 3600.0;
            let noise: f64 = rng.sample(StandardNormal);
            let temperature =
                MEAN_TEMPERATURE + DAILY_SWING * (2.0 * PI * hours / 24.0).sin() + NOISE * noise;
            (time, (temperature * 100.0).round() / 100.0)
        })
        .collect()
}

fn to_reading((time, temperature): &(NaiveDateTime, f64)) -> Reading {
    Reading {
        timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
        temperature: *temperature,
    }
}

// Bounds arrive as entered in a datetime-local field and are compared as
// text against the stored timestamps.
fn normalize_bound(bound: &str) -> String {
    bound.replacen('T', " ", 1)
}

fn failure() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Database error.").into_response()
}

async fn get_temperature(State(thermometer): State<FakeThermometerHandle>) -> Response {
    if thermometer.fail_latest {
        return failure();
    }
    match thermometer.readings.last() {
        Some(reading) => Json(to_reading(reading)).into_response(),
        None => Json(serde_json::json!({"error": "No data available"})).into_response(),
    }
}

async fn get_history(
    State(thermometer): State<FakeThermometerHandle>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if thermometer.fail_history {
        return failure();
    }
    let start = normalize_bound(query.start_datetime.as_deref().unwrap_or("1970-01-01T00:00"));
    let end = normalize_bound(query.end_datetime.as_deref().unwrap_or("2100-01-01T00:00"));
    println!("History requested from {start} to {end}");
    let readings: Vec<Reading> = thermometer
        .readings
        .iter()
        .rev()
        .map(to_reading)
        .filter(|reading| start.as_str() <= reading.timestamp.as_str() && reading.timestamp <= end)
        .collect();
    Json(readings).into_response()
}

async fn get_stats(State(thermometer): State<FakeThermometerHandle>) -> Response {
    if thermometer.fail_stats {
        return failure();
    }
    let since = Local::now().naive_local() - Duration::days(1);
    let last_day: Vec<f64> = thermometer
        .readings
        .iter()
        .filter(|(time, _)| *time >= since)
        .map(|(_, temperature)| *temperature)
        .collect();
    if last_day.is_empty() {
        Json(serde_json::json!({"error": "No data available"})).into_response()
    } else {
        let average = last_day.iter().sum::<f64>() / last_day.len() as f64;
        Json(serde_json::json!({"average_temperature": average})).into_response()
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let readings = generate_readings(
        Local::now().naive_local(),
        args.days,
        args.interval_minutes,
    );
    println!("Generated {} readings", readings.len());
    let thermometer = Arc::new(FakeThermometer {
        readings,
        fail_latest: args.fail_latest,
        fail_history: args.fail_history,
        fail_stats: args.fail_stats,
    });

    let app = Router::new()
        .route("/temperature", get(get_temperature))
        .route("/history", get(get_history))
        .route("/stats", get(get_stats))
        .with_state(thermometer);

    let listener = match tokio::net::TcpListener::bind(args.address).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("Failed to bind to address {} ({})", args.address, err);
            process::exit(1);
        }
    };
    println!("Listening on {}", args.address);
    if let Err(err) = axum::serve(listener, app).await {
        println!("Server stopped ({})", err);
        process::exit(1);
    }
}
