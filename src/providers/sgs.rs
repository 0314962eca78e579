use crate::error::FetchError;
use crate::providers::{RateSource, http_client};
use crate::series::SeriesPoint;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

const DATE_FMT: &str = "%d/%m/%Y";

/// Client for the BCB SGS time-series API. Payloads carry dates as
/// `dd/mm/yyyy` strings and values as decimal strings.
pub struct SgsClient {
    base_url: String,
}

impl SgsClient {
    pub fn new(base_url: &str) -> Self {
        SgsClient {
            base_url: base_url.to_string(),
        }
    }

    async fn get_text(&self, context: &str, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let client = http_client(context)?;
        let response = client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::request(context, e))?;

        if !response.status().is_success() {
            return Err(FetchError::payload(
                context,
                format!("http status {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::request(context, e))
    }
}

#[derive(Debug, Deserialize)]
struct SgsObservation {
    data: String,
    valor: String,
}

fn parse_observations(context: &str, payload: &str) -> Result<Vec<SeriesPoint>, FetchError> {
    let observations: Vec<SgsObservation> = serde_json::from_str(payload)
        .map_err(|e| FetchError::payload(context, e.to_string()))?;

    observations
        .iter()
        .map(|obs| {
            let date = NaiveDate::parse_from_str(&obs.data, DATE_FMT).map_err(|e| {
                FetchError::payload(context, format!("bad date {:?}: {e}", obs.data))
            })?;
            let value: f64 = obs
                .valor
                .trim()
                .parse()
                .map_err(|_| FetchError::payload(context, format!("bad value {:?}", obs.valor)))?;
            Ok(SeriesPoint { date, value })
        })
        .collect()
}

#[async_trait]
impl RateSource for SgsClient {
    #[instrument(name = "SgsFetch", skip(self), fields(code = code))]
    async fn fetch(
        &self,
        code: u32,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        let context = format!("sgs series {code}");
        let url = format!("{}/dados/serie/bcdata.sgs.{}/dados", self.base_url, code);

        let mut query = vec![
            ("formato", "json".to_string()),
            ("dataInicial", start.format(DATE_FMT).to_string()),
        ];
        if let Some(end) = end {
            query.push(("dataFinal", end.format(DATE_FMT).to_string()));
        }
        debug!("Requesting series data from {}", url);

        let text = self.get_text(&context, &url, &query).await?;
        parse_observations(&context, &text)
    }

    async fn latest_date(&self, code: u32) -> Result<NaiveDate, FetchError> {
        let context = format!("sgs series {code} latest date");
        let url = format!(
            "{}/dados/serie/bcdata.sgs.{}/dados/ultimos/1",
            self.base_url, code
        );
        debug!("Requesting latest available date from {}", url);

        let text = self
            .get_text(&context, &url, &[("formato", "json".to_string())])
            .await?;
        let points = parse_observations(&context, &text)?;
        points
            .last()
            .map(|p| p.date)
            .ok_or_else(|| FetchError::Empty { context })
    }
}
