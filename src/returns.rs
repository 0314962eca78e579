use crate::error::InvalidPeriodError;
use crate::series::{MergedRow, MergedSeries};
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Period return in percent for a cumulative factor.
pub fn period_return(factor: f64) -> f64 {
    (factor - 1.0) * 100.0
}

/// Cumulative-return factors over a selected sub-period, each index
/// normalized to 1.0 at the period's first observation. Computed fresh per
/// call; never mutates the series it reads.
#[derive(Debug, Clone)]
pub struct PeriodReturns {
    days: usize,
    first: MergedRow,
    last: MergedRow,
    dates: Vec<NaiveDate>,
    usd: Vec<f64>,
    di: Vec<f64>,
    corp: Vec<f64>,
}

impl PeriodReturns {
    /// Slices `series` to `start <= date <= end` (inclusive) and builds the
    /// factor table. An empty slice is rejected: annualization over zero
    /// observations is undefined.
    pub fn compute(
        series: &MergedSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, InvalidPeriodError> {
        let window = series.slice(start, end);
        if window.is_empty() {
            return Err(InvalidPeriodError::Empty { start, end });
        }

        let dates: Vec<NaiveDate> = window.iter().map(|r| r.date).collect();

        let first_usd = window[0].usd;
        let usd: Vec<f64> = window.iter().map(|r| r.usd / first_usd).collect();

        // DI is quoted as a daily rate in percent, so its level is the
        // running product of (1 + rate/100).
        let mut di = Vec::with_capacity(window.len());
        let mut cumulative = 1.0;
        for row in window {
            cumulative *= 1.0 + row.di / 100.0;
            di.push(cumulative);
        }
        let first_di = di[0];
        for value in &mut di {
            *value /= first_di;
        }

        let first_corp = window[0].corp;
        let corp: Vec<f64> = window.iter().map(|r| r.corp / first_corp).collect();

        Ok(PeriodReturns {
            days: window.len(),
            first: window[0],
            last: window[window.len() - 1],
            dates,
            usd,
            di,
            corp,
        })
    }

    /// Number of observations in the period, the compounding base.
    pub fn days(&self) -> usize {
        self.days
    }

    pub fn first(&self) -> &MergedRow {
        &self.first
    }

    pub fn last(&self) -> &MergedRow {
        &self.last
    }

    pub fn usd_factor(&self) -> f64 {
        self.usd[self.days - 1]
    }

    pub fn di_factor(&self) -> f64 {
        self.di[self.days - 1]
    }

    pub fn corp_factor(&self) -> f64 {
        self.corp[self.days - 1]
    }

    /// DI return expressed in USD terms.
    pub fn di_usd_factor(&self) -> f64 {
        self.di_factor() / self.usd_factor()
    }

    /// Excess of the DI-in-USD strategy over the benchmark.
    pub fn excess_factor(&self) -> f64 {
        self.di_usd_factor() / self.corp_factor()
    }

    /// Annualized return in percent, assuming 252 trading days per year.
    /// `compute` guarantees at least one observation, so the exponent is
    /// always finite.
    pub fn annualized(&self, factor: f64) -> f64 {
        let exponent = TRADING_DAYS_PER_YEAR as f64 / self.days as f64;
        (factor.powf(exponent) - 1.0) * 100.0
    }

    /// Chart-ready cumulative percent above the period start, keyed by
    /// display label.
    pub fn chart_series(&self) -> Vec<LabeledSeries> {
        let di_usd: Vec<f64> = self
            .di
            .iter()
            .zip(&self.usd)
            .map(|(di, usd)| di / usd)
            .collect();
        let excess: Vec<f64> = di_usd
            .iter()
            .zip(&self.corp)
            .map(|(du, corp)| du / corp)
            .collect();

        let to_points = |values: &[f64]| -> Vec<(NaiveDate, f64)> {
            self.dates
                .iter()
                .zip(values)
                .map(|(&date, &value)| (date, period_return(value)))
                .collect()
        };

        vec![
            LabeledSeries {
                label: "USD",
                points: to_points(&self.usd),
            },
            LabeledSeries {
                label: "DI in USD",
                points: to_points(&di_usd),
            },
            LabeledSeries {
                label: "US Corp IG Index",
                points: to_points(&self.corp),
            },
            LabeledSeries {
                label: "Excess DI USD",
                points: to_points(&excess),
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LabeledSeries {
    pub label: &'static str,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Rolling N-year annualized excess of DI-in-USD over the benchmark, one
/// point per trading date once the window is covered. Uses the full
/// history, not a selected sub-period.
pub fn rolling_excess(
    series: &MergedSeries,
    years: usize,
) -> Result<RollingExcess, InvalidPeriodError> {
    if years == 0 {
        return Err(InvalidPeriodError::ZeroWindow);
    }

    let rows = series.rows();
    let mut dates = Vec::with_capacity(rows.len());
    let mut ratio = Vec::with_capacity(rows.len());
    let mut di_cumulative = 1.0;
    for row in rows {
        di_cumulative *= 1.0 + row.di / 100.0;
        dates.push(row.date);
        ratio.push(di_cumulative / row.usd / row.corp);
    }

    Ok(RollingExcess {
        dates,
        ratio,
        window: years * TRADING_DAYS_PER_YEAR,
        pos: years * TRADING_DAYS_PER_YEAR,
    })
}

/// Iterator over (date, annualized excess %). Empty when the window is at
/// least as long as the history.
#[derive(Debug, Clone)]
pub struct RollingExcess {
    dates: Vec<NaiveDate>,
    ratio: Vec<f64>,
    window: usize,
    pos: usize,
}

impl Iterator for RollingExcess {
    type Item = (NaiveDate, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.ratio.len() {
            return None;
        }
        let t = self.pos;
        self.pos += 1;

        let factor = self.ratio[t] / self.ratio[t - self.window];
        let exponent = TRADING_DAYS_PER_YEAR as f64 / self.window as f64;
        Some((self.dates[t], (factor.powf(exponent) - 1.0) * 100.0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ratio.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingExcess {}
