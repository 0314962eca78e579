pub mod fred;
pub mod sgs;

use crate::error::FetchError;
use crate::series::SeriesPoint;
use async_trait::async_trait;
use chrono::NaiveDate;

/// BCB SGS series codes and the FRED benchmark id.
pub const USD_SGS_CODE: u32 = 1;
pub const DI_SGS_CODE: u32 = 12;
pub const CORP_FRED_ID: &str = "BAMLCC0A0CMTRIV";

pub(crate) const USER_AGENT: &str = "diusd/0.1";

/// Source of the domestic daily series (exchange rate and DI), identified
/// by numeric SGS codes. Also answers the cheap "latest available date"
/// probe used by the incremental sync.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(
        &self,
        code: u32,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, FetchError>;

    async fn latest_date(&self, code: u32) -> Result<NaiveDate, FetchError>;
}

/// Source of the benchmark index, identified by a string series id and
/// optionally bounded by an observation start date.
#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    async fn fetch(&self, series_id: &str, start: NaiveDate) -> Result<Vec<SeriesPoint>, FetchError>;
}

pub(crate) fn http_client(context: &str) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::request(context, e))
}
