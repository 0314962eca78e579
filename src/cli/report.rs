use super::ui;
use crate::config::AppConfig;
use crate::returns::{self, PeriodReturns, TRADING_DAYS_PER_YEAR};
use crate::store::SnapshotStore;
use anyhow::{Result, bail};
use chrono::NaiveDate;

pub fn run(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    window_years: Option<usize>,
) -> Result<()> {
    let store = SnapshotStore::new(&config.snapshot_path);
    let snapshot = store.load()?;
    if snapshot.series.is_empty() {
        bail!("no data downloaded yet; run `diusd sync` first");
    }

    let period = PeriodReturns::compute(&snapshot.series, start, end)?;

    println!(
        "{} trading days ({:.2} years)\n",
        period.days(),
        period.days() as f64 / TRADING_DAYS_PER_YEAR as f64
    );

    println!("{}", ui::title("Quotes"));
    println!("{}", quote_table(&period));

    println!("\n{}", ui::title("Returns"));
    println!("{}", returns_table(&period));

    if let Some(years) = window_years {
        println!("\n{}", ui::title("Rolling excess"));
        print_rolling_summary(&snapshot.series, years)?;
    }

    Ok(())
}

fn quote_table(period: &PeriodReturns) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Date"),
        ui::header_cell("USD"),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("Start"),
        ui::value_cell(period.first().date.format("%d/%m/%Y").to_string()),
        ui::value_cell(format!("{:.4}", period.first().usd)),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("End"),
        ui::value_cell(period.last().date.format("%d/%m/%Y").to_string()),
        ui::value_cell(format!("{:.4}", period.last().usd)),
    ]);
    table
}

fn returns_table(period: &PeriodReturns) -> comfy_table::Table {
    let rows = [
        ("USD", period.usd_factor()),
        ("DI", period.di_factor()),
        ("DI USD", period.di_usd_factor()),
        ("US Corp IG Index", period.corp_factor()),
        ("Excess DI USD", period.excess_factor()),
    ];

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Index"),
        ui::header_cell("Period"),
        ui::header_cell("Annual"),
    ]);
    for (label, factor) in rows {
        table.add_row(vec![
            comfy_table::Cell::new(label),
            ui::change_cell(returns::period_return(factor)),
            ui::change_cell(period.annualized(factor)),
        ]);
    }
    table
}

fn print_rolling_summary(series: &crate::series::MergedSeries, years: usize) -> Result<()> {
    let points: Vec<_> = returns::rolling_excess(series, years)?.collect();
    match points.last() {
        Some((date, value)) => println!(
            "{} points; latest {years}-year annualized excess: {value:.2}% on {date}",
            points.len()
        ),
        None => println!("not enough history for a {years}-year window"),
    }
    Ok(())
}
