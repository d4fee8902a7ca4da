use serde::{Deserialize, Serialize};

/// One temperature sample as reported by the temperature service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub timestamp: String,
}

/// Answer of the `/stats` endpoint. The service reports
/// `{"error": "No data available"}` when it has nothing for the last day.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Stats {
    #[serde(default)]
    pub average_temperature: Option<f64>,
}

/// Timestamps and temperatures of a history, as two parallel sequences in
/// the order the service returned them.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct HistorySeries {
    pub timestamps: Vec<String>,
    pub temperatures: Vec<f64>,
}

impl HistorySeries {
    pub fn from_readings(readings: &[Reading]) -> HistorySeries {
        let (timestamps, temperatures) = readings
            .iter()
            .map(|reading| (reading.timestamp.clone(), reading.temperature))
            .unzip();
        HistorySeries {
            timestamps,
            temperatures,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
