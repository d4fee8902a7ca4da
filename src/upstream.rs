use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::models::reading::{Reading, Stats};
use crate::models::time_range::TimeRange;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("temperature service responded with {0}")]
    Status(StatusCode),
    #[error("could not reach temperature service: {source}")]
    Transport { source: reqwest::Error },
    #[error("could not decode temperature service response: {source}")]
    Decode { source: reqwest::Error },
    #[error("could not create http client: {source}")]
    Client { source: reqwest::Error },
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Where the dashboard gets its readings from.
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    async fn latest(&self) -> UpstreamResult<Reading>;
    async fn history(&self, range: &TimeRange) -> UpstreamResult<Vec<Reading>>;
    async fn stats(&self) -> UpstreamResult<Stats>;
}

/// Talks to the temperature service over HTTP. Each call is a single request;
/// failures are reported, never retried.
pub struct HttpTemperatureSource {
    client: Client,
    base_url: String,
}

impl HttpTemperatureSource {
    pub fn new(base_url: &str, timeout: Duration) -> UpstreamResult<HttpTemperatureSource> {
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|source| UpstreamError::Client { source })?;
        Ok(HttpTemperatureSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> UpstreamResult<T> {
        let url = format!("{}{}", self.base_url, path);
        log::trace!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { source })?;
        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status(response.status()));
        }
        response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode { source })
    }
}

#[async_trait]
impl TemperatureSource for HttpTemperatureSource {
    async fn latest(&self) -> UpstreamResult<Reading> {
        self.get_json("/temperature", &[]).await
    }

    async fn history(&self, range: &TimeRange) -> UpstreamResult<Vec<Reading>> {
        self.get_json(
            "/history",
            &[
                ("start_datetime", range.start.as_str()),
                ("end_datetime", range.end.as_str()),
            ],
        )
        .await
    }

    async fn stats(&self) -> UpstreamResult<Stats> {
        self.get_json("/stats", &[]).await
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_service(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn source_for(addr: SocketAddr) -> HttpTemperatureSource {
        HttpTemperatureSource::new(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_latest_reading() {
        let addr = spawn_service(Router::new().route(
            "/temperature",
            get(|| async {
                Json(Reading {
                    temperature: 23.25,
                    timestamp: "2024-03-01 10:00:00".to_string(),
                })
            }),
        ))
        .await;

        let reading = source_for(addr).latest().await.unwrap();
        assert_eq!(reading.temperature, 23.25);
        assert_eq!(reading.timestamp, "2024-03-01 10:00:00");
    }

    #[tokio::test]
    async fn test_history_passes_range_verbatim() {
        // Echoes the received bounds back as timestamps.
        let addr = spawn_service(Router::new().route(
            "/history",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(vec![
                    Reading {
                        temperature: 1.0,
                        timestamp: params["start_datetime"].clone(),
                    },
                    Reading {
                        temperature: 2.0,
                        timestamp: params["end_datetime"].clone(),
                    },
                ])
            }),
        ))
        .await;

        let range = TimeRange {
            start: "2024-01-01T00:00".to_string(),
            end: "not a date & more".to_string(),
        };
        let readings = source_for(addr).history(&range).await.unwrap();
        assert_eq!(readings[0].timestamp, range.start);
        assert_eq!(readings[1].timestamp, range.end);
    }

    #[tokio::test]
    async fn test_non_ok_status_is_reported() {
        let addr = spawn_service(Router::new().route(
            "/temperature",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        ))
        .await;

        match source_for(addr).latest().await {
            Err(UpstreamError::Status(status)) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_reported() {
        let addr = spawn_service(Router::new()).await;

        match source_for(addr).stats().await {
            Err(UpstreamError::Status(status)) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_reported() {
        let addr = spawn_service(Router::new().route(
            "/temperature",
            get(|| async { r#"{"error": "No data available"}"# }),
        ))
        .await;

        assert!(matches!(
            source_for(addr).latest().await,
            Err(UpstreamError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(matches!(
            source_for(addr).latest().await,
            Err(UpstreamError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let addr = spawn_service(Router::new().route(
            "/temperature",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        ))
        .await;

        let source =
            HttpTemperatureSource::new(&format!("http://{addr}"), Duration::from_millis(200))
                .unwrap();
        match source.latest().await {
            Err(UpstreamError::Transport { source }) => assert!(source.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
