use crate::error::FetchError;
use crate::providers::{BenchmarkSource, http_client};
use crate::series::SeriesPoint;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Client for the FRED `series/observations` endpoint. FRED reports
/// missing observations with a literal `"."` value; those are skipped.
pub struct FredClient {
    base_url: String,
    api_key: String,
}

impl FredClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        FredClient {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FredResponse {
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

#[async_trait]
impl BenchmarkSource for FredClient {
    #[instrument(name = "FredFetch", skip(self), fields(series_id = %series_id))]
    async fn fetch(&self, series_id: &str, start: NaiveDate) -> Result<Vec<SeriesPoint>, FetchError> {
        let context = format!("fred series {series_id}");
        let url = format!("{}/fred/series/observations", self.base_url);
        debug!("Requesting benchmark data from {}", url);

        let client = http_client(&context)?;
        let response = client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", &self.api_key),
                ("file_type", "json"),
                ("observation_start", &start.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::request(&context, e))?;

        if !response.status().is_success() {
            return Err(FetchError::payload(
                &context,
                format!("http status {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::request(&context, e))?;
        let parsed: FredResponse = serde_json::from_str(&text)
            .map_err(|e| FetchError::payload(&context, e.to_string()))?;

        let mut points = Vec::with_capacity(parsed.observations.len());
        for obs in &parsed.observations {
            // "." marks a date with no published value.
            if obs.value.trim() == "." {
                continue;
            }
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").map_err(|e| {
                FetchError::payload(&context, format!("bad date {:?}: {e}", obs.date))
            })?;
            let value: f64 = obs
                .value
                .trim()
                .parse()
                .map_err(|_| FetchError::payload(&context, format!("bad value {:?}", obs.value)))?;
            points.push(SeriesPoint { date, value });
        }

        Ok(points)
    }
}
