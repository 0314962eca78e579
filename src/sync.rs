use crate::error::SyncError;
use crate::providers::{BenchmarkSource, CORP_FRED_ID, DI_SGS_CODE, RateSource, USD_SGS_CODE};
use crate::series::MergedSeries;
use crate::store::{Snapshot, SnapshotStore};
use chrono::{Days, Local, NaiveDate};
use futures::future::try_join3;
use tracing::{debug, info};

/// SGS series probed for the latest available upstream date. Only the BCB
/// source is probed; the FRED benchmark can lag behind this check without
/// being noticed (known staleness gap, kept on purpose).
const LATEST_PROBE_SGS_CODE: u32 = DI_SGS_CODE;

/// Keeps the persisted series current over a trailing window of `years`
/// years ending yesterday, re-downloading as little as possible.
pub struct SyncEngine<'a> {
    store: &'a SnapshotStore,
    rates: &'a dyn RateSource,
    benchmark: &'a dyn BenchmarkSource,
    years: u32,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        store: &'a SnapshotStore,
        rates: &'a dyn RateSource,
        benchmark: &'a dyn BenchmarkSource,
        years: u32,
    ) -> Self {
        SyncEngine {
            store,
            rates,
            benchmark,
            years,
        }
    }

    pub async fn sync(&self) -> Result<Snapshot, SyncError> {
        self.sync_at(Local::now().date_naive()).await
    }

    /// `sync` with the clock pinned, so tests are deterministic.
    pub async fn sync_at(&self, today: NaiveDate) -> Result<Snapshot, SyncError> {
        let yesterday = today - Days::new(1);
        let base_date = yesterday - Days::new(365 * u64::from(self.years));

        let saved = self.store.load()?;

        // Full rebuild when there is nothing usable: never refreshed,
        // refreshed on an earlier day, empty, or not reaching back to the
        // requested window start.
        let needs_rebuild = match (saved.last_refresh, saved.series.first_date()) {
            (Some(refreshed), Some(first)) => refreshed != today || first > base_date,
            _ => true,
        };

        if needs_rebuild {
            info!("downloading the full window from {base_date}");
            let series = self.fetch_merged(base_date, today).await?;
            let snapshot = Snapshot {
                last_refresh: Some(today),
                series,
            };
            self.store.save(&snapshot)?;
            return Ok(snapshot);
        }

        // needs_rebuild covered the empty case.
        let last = saved
            .series
            .last_date()
            .expect("non-empty series checked above");
        let new_start = last + Days::new(1);

        info!("checking for dates after {last}");
        let latest_upstream = self.rates.latest_date(LATEST_PROBE_SGS_CODE).await?;
        if latest_upstream <= new_start {
            debug!("no new upstream data (latest available {latest_upstream})");
            return Ok(saved);
        }

        let chunk = self.fetch_merged(new_start, today).await?;
        let mut snapshot = saved;
        snapshot.series.extend(chunk);
        snapshot.last_refresh = Some(today);
        self.store.save(&snapshot)?;
        Ok(snapshot)
    }

    async fn fetch_merged(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MergedSeries, SyncError> {
        // The three fetches are independent reads; only the merge after all
        // of them has an ordering dependency.
        let (di, usd, corp) = try_join3(
            self.rates.fetch(DI_SGS_CODE, start, Some(end)),
            self.rates.fetch(USD_SGS_CODE, start, Some(end)),
            self.benchmark.fetch(CORP_FRED_ID, start),
        )
        .await?;

        Ok(MergedSeries::merge(&di, &usd, &corp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::series::SeriesPoint;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FakeRates {
        points: Vec<SeriesPoint>,
        latest: NaiveDate,
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RateSource for FakeRates {
        async fn fetch(
            &self,
            _code: u32,
            start: NaiveDate,
            end: Option<NaiveDate>,
        ) -> Result<Vec<SeriesPoint>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::payload("sgs series 12", "simulated failure"));
            }
            Ok(self
                .points
                .iter()
                .filter(|p| p.date >= start && end.is_none_or(|e| p.date <= e))
                .copied()
                .collect())
        }

        async fn latest_date(&self, _code: u32) -> Result<NaiveDate, FetchError> {
            Ok(self.latest)
        }
    }

    struct FakeBenchmark {
        points: Vec<SeriesPoint>,
    }

    #[async_trait]
    impl BenchmarkSource for FakeBenchmark {
        async fn fetch(
            &self,
            _series_id: &str,
            start: NaiveDate,
        ) -> Result<Vec<SeriesPoint>, FetchError> {
            Ok(self
                .points
                .iter()
                .filter(|p| p.date >= start)
                .copied()
                .collect())
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One point per calendar day over [start, start + n).
    fn daily_points(start: NaiveDate, n: usize, value: f64) -> Vec<SeriesPoint> {
        (0..n)
            .map(|i| SeriesPoint {
                date: start + Days::new(i as u64),
                value,
            })
            .collect()
    }

    const TODAY: NaiveDate = match NaiveDate::from_ymd_opt(2024, 6, 10) {
        Some(d) => d,
        None => panic!("valid date"),
    };

    fn fakes(latest: NaiveDate) -> (FakeRates, FakeBenchmark) {
        // History reaching back two years, so a one-year window never
        // triggers the too-short rebuild.
        let start = day(2022, 6, 1);
        let n = 740;
        let rates = FakeRates {
            points: daily_points(start, n, 5.0),
            latest,
            fetches: AtomicUsize::new(0),
            fail: false,
        };
        let benchmark = FakeBenchmark {
            points: daily_points(start, n, 3000.0),
        };
        (rates, benchmark)
    }

    #[tokio::test]
    async fn first_sync_rebuilds_and_commits() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data.json"));
        let (rates, benchmark) = fakes(TODAY - Days::new(1));

        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        let snapshot = engine.sync_at(TODAY).await.unwrap();

        assert_eq!(snapshot.last_refresh, Some(TODAY));
        assert!(!snapshot.series.is_empty());
        // Only the trailing window was requested.
        let base_date = TODAY - Days::new(1) - Days::new(365);
        assert!(snapshot.series.first_date().unwrap() >= base_date);
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[tokio::test]
    async fn same_day_resync_with_no_news_is_a_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = SnapshotStore::new(&path);

        // Upstream has nothing past what the rebuild already fetched.
        let (rates, benchmark) = fakes(day(2024, 6, 8));

        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        let first = engine.sync_at(TODAY).await.unwrap();
        let bytes_after_rebuild = fs::read(&path).unwrap();
        let fetches_after_rebuild = rates.fetches.load(Ordering::SeqCst);

        let second = engine.sync_at(TODAY).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&path).unwrap(), bytes_after_rebuild);
        // The no-op path only probed; it did not fetch series data.
        assert_eq!(rates.fetches.load(Ordering::SeqCst), fetches_after_rebuild);
    }

    #[tokio::test]
    async fn stale_refresh_date_triggers_rebuild() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data.json"));
        let (rates, benchmark) = fakes(TODAY - Days::new(1));

        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        engine.sync_at(TODAY - Days::new(3)).await.unwrap();
        let snapshot = engine.sync_at(TODAY).await.unwrap();

        assert_eq!(snapshot.last_refresh, Some(TODAY));
    }

    #[tokio::test]
    async fn short_history_triggers_rebuild_when_window_grows() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data.json"));
        let (rates, benchmark) = fakes(TODAY - Days::new(1));

        // A one-year snapshot refreshed today...
        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        let narrow = engine.sync_at(TODAY).await.unwrap();

        // ...does not reach back far enough once the window is two years.
        let wider_engine = SyncEngine::new(&store, &rates, &benchmark, 2);
        let wide = wider_engine.sync_at(TODAY).await.unwrap();

        assert!(wide.series.first_date().unwrap() < narrow.series.first_date().unwrap());
        assert!(wide.series.len() > narrow.series.len());
    }

    #[tokio::test]
    async fn incremental_appends_only_new_dates() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data.json"));

        let history_end = day(2024, 6, 5);
        let (rates, benchmark) = fakes(day(2024, 6, 9));

        // Rebuild sees history up to June 5 only.
        let short_rates = FakeRates {
            points: rates
                .points
                .iter()
                .filter(|p| p.date <= history_end)
                .copied()
                .collect(),
            latest: history_end,
            fetches: AtomicUsize::new(0),
            fail: false,
        };
        let engine = SyncEngine::new(&store, &short_rates, &benchmark, 1);
        let rebuilt = engine.sync_at(TODAY).await.unwrap();
        assert_eq!(rebuilt.series.last_date(), Some(history_end));

        // Later the same day new dates appear upstream.
        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        let extended = engine.sync_at(TODAY).await.unwrap();

        assert_eq!(extended.series.last_date(), Some(day(2024, 6, 9)));
        assert_eq!(
            extended.series.len(),
            rebuilt.series.len() + 4,
            "only the four new dates were appended"
        );
        // Existing rows were not rewritten.
        assert_eq!(
            extended.series.rows()[..rebuilt.series.len()],
            rebuilt.series.rows()[..]
        );
        let dates: Vec<_> = extended.series.rows().iter().map(|r| r.date).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn fetch_failure_leaves_snapshot_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = SnapshotStore::new(&path);

        let (rates, benchmark) = fakes(TODAY - Days::new(1));
        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        engine.sync_at(TODAY - Days::new(1)).await.unwrap();
        let bytes_before = fs::read(&path).unwrap();

        let failing = FakeRates {
            points: vec![],
            latest: TODAY,
            fetches: AtomicUsize::new(0),
            fail: true,
        };
        let engine = SyncEngine::new(&store, &failing, &benchmark, 1);
        let err = engine.sync_at(TODAY).await.unwrap_err();

        assert!(matches!(err, SyncError::Fetch(_)));
        assert_eq!(fs::read(&path).unwrap(), bytes_before);
    }

    #[tokio::test]
    async fn latest_equal_to_new_start_does_not_fetch() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data.json"));

        let history_end = day(2024, 6, 5);
        let rates = FakeRates {
            points: daily_points(day(2022, 6, 1), 736, 5.0),
            latest: history_end + Days::new(1), // exactly new_start
            fetches: AtomicUsize::new(0),
            fail: false,
        };
        let benchmark = FakeBenchmark {
            points: daily_points(day(2022, 6, 1), 736, 3000.0),
        };

        let engine = SyncEngine::new(&store, &rates, &benchmark, 1);
        let rebuilt = engine.sync_at(TODAY).await.unwrap();
        assert_eq!(rebuilt.series.last_date(), Some(history_end));
        let fetches = rates.fetches.load(Ordering::SeqCst);

        let again = engine.sync_at(TODAY).await.unwrap();
        assert_eq!(again, rebuilt);
        assert_eq!(rates.fetches.load(Ordering::SeqCst), fetches);
    }
}
