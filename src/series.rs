use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single (date, value) observation from one upstream source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One fully-populated observation on the merged calendar. `usd` is the
/// BRL/USD exchange rate level, `di` the DI daily rate in percent, `corp`
/// the benchmark index level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub usd: f64,
    pub di: f64,
    pub corp: f64,
}

/// Date-ascending table of merged observations. Dates are strictly
/// increasing and unique; every retained row carries all three fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedSeries {
    rows: Vec<MergedRow>,
}

impl MergedSeries {
    /// Merges the three source series onto the DI calendar.
    ///
    /// For each DI date the latest USD value at-or-before that date is
    /// taken (left join plus forward fill); dates with no USD history yet
    /// are dropped. The benchmark is aligned the same way, so dates before
    /// benchmark inception are dropped too.
    pub fn merge(di: &[SeriesPoint], usd: &[SeriesPoint], corp: &[SeriesPoint]) -> Self {
        let di_by_date: BTreeMap<NaiveDate, f64> = di.iter().map(|p| (p.date, p.value)).collect();
        let usd_by_date: BTreeMap<NaiveDate, f64> = usd.iter().map(|p| (p.date, p.value)).collect();
        let corp_by_date: BTreeMap<NaiveDate, f64> =
            corp.iter().map(|p| (p.date, p.value)).collect();

        let mut rows = Vec::with_capacity(di_by_date.len());
        for (&date, &di_value) in &di_by_date {
            let Some((_, &usd_value)) = usd_by_date.range(..=date).next_back() else {
                continue;
            };
            let Some((_, &corp_value)) = corp_by_date.range(..=date).next_back() else {
                continue;
            };
            rows.push(MergedRow {
                date,
                usd: usd_value,
                di: di_value,
                corp: corp_value,
            });
        }

        MergedSeries { rows }
    }

    pub fn from_rows(rows: Vec<MergedRow>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        MergedSeries { rows }
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Rows with `start <= date <= end`. A reversed range is just empty.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> &[MergedRow] {
        let lo = self.rows.partition_point(|r| r.date < start);
        let hi = self.rows.partition_point(|r| r.date <= end);
        if lo >= hi { &[] } else { &self.rows[lo..hi] }
    }

    /// Appends `newer`, keeping only dates strictly after the current last
    /// date so the ascending-unique invariant survives a concat.
    pub fn extend(&mut self, newer: MergedSeries) {
        let cutoff = self.last_date();
        self.rows.extend(
            newer
                .rows
                .into_iter()
                .filter(|r| cutoff.is_none_or(|c| r.date > c)),
        );
    }
}
