// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Weekly price history for the peer set and the benchmark index.

use crate::config::Config;
use crate::market_data::{HistoryRange, Interval, MarketData};
use crate::progress::Reporter;
use crate::workbook::{CellValue, Dataset};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};

pub type Points = Vec<(NaiveDate, f64)>;

/// One named column of the price table
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub name: String,
    pub points: Points,
}

/// The Friday closing the W-FRI week that contains `date` (Saturday rolls forward)
pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let friday = Weekday::Fri.num_days_from_monday() as i64;
    date + Duration::days((friday - from_monday).rem_euclid(7))
}

/// Resample to weekly bins ending Friday, keeping the last value of each bin.
/// Empty weeks produce no point.
pub fn resample_weekly(points: &[(NaiveDate, f64)]) -> Points {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|(date, _)| *date);

    let mut weeks = BTreeMap::new();
    for (date, value) in sorted {
        weeks.insert(week_ending_friday(date), value);
    }
    weeks.into_iter().collect()
}

/// Five years of weekly closes, falling back to one year of daily closes
/// resampled to weekly. `None` when neither reaches `min_points`.
pub async fn weekly_series<M: MarketData>(market: &M, symbol: &str, min_points: usize) -> Option<Points> {
    match market
        .history(symbol, HistoryRange::FiveYears, Interval::Weekly)
        .await
    {
        Ok(history) => {
            let points = history.closing_points();
            if points.len() >= min_points {
                return Some(points);
            }
            tracing::debug!("{}: only {} weekly points, trying daily", symbol, points.len());
        }
        Err(e) => tracing::debug!("{}: weekly history failed: {}", symbol, e),
    }

    match market
        .history(symbol, HistoryRange::OneYear, Interval::Daily)
        .await
    {
        Ok(history) => {
            let points = resample_weekly(&history.closing_points());
            (points.len() >= min_points).then_some(points)
        }
        Err(e) => {
            tracing::debug!("{}: daily history failed: {}", symbol, e);
            None
        }
    }
}

/// Outer join of several price series on date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    pub columns: Vec<String>,
    pub rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl PriceTable {
    /// Union of all dates, sorted; gaps stay `None`. Column order follows `series`.
    pub fn join(series: &[PriceSeries]) -> Self {
        let lookups: Vec<BTreeMap<NaiveDate, f64>> = series
            .iter()
            .map(|s| s.points.iter().copied().collect())
            .collect();

        let dates: BTreeSet<NaiveDate> = lookups.iter().flat_map(|m| m.keys().copied()).collect();

        let rows = dates
            .into_iter()
            .map(|date| {
                let values = lookups.iter().map(|m| m.get(&date).copied()).collect();
                (date, values)
            })
            .collect();

        Self {
            columns: series.iter().map(|s| s.name.clone()).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_dataset(&self) -> Dataset {
        let mut columns = vec!["Date".to_string()];
        columns.extend(self.columns.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|(date, values)| {
                let mut row = vec![CellValue::Date(*date)];
                row.extend(values.iter().map(|v| CellValue::from(*v)));
                row
            })
            .collect();

        Dataset::new(columns, rows)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PriceFetch {
    pub table: PriceTable,
    /// Symbols with usable history, input order kept, target first
    pub retained: Vec<String>,
}

/// Fetch the benchmark and every candidate, drop the ones without enough
/// history and join the rest. Returns an empty fetch when no candidate survives.
pub async fn fetch_price_history<M: MarketData>(
    market: &M,
    config: &Config,
    candidates: &[String],
    target: &str,
    reporter: &dyn Reporter,
) -> PriceFetch {
    let benchmark = weekly_series(market, &config.benchmark_symbol, config.min_points).await;
    if benchmark.is_none() {
        reporter.warn(format!(
            "{}: no usable benchmark history, continuing without it",
            config.benchmark_label
        ));
    }

    let mut fetched = Vec::new();
    for (i, symbol) in candidates.iter().enumerate() {
        reporter.progress(i + 1, candidates.len(), symbol);
        let market_symbol = config.market_symbol(symbol);
        match weekly_series(market, &market_symbol, config.min_points).await {
            Some(points) => fetched.push(PriceSeries {
                name: symbol.clone(),
                points,
            }),
            None => tracing::info!("Dropping {}: insufficient price history", symbol),
        }
    }

    if fetched.is_empty() {
        return PriceFetch::default();
    }

    // target first, the others in candidate order
    if let Some(pos) = fetched.iter().position(|s| s.name == target) {
        let target_series = fetched.remove(pos);
        fetched.insert(0, target_series);
    }
    let retained: Vec<String> = fetched.iter().map(|s| s.name.clone()).collect();

    let mut series = Vec::with_capacity(fetched.len() + 1);
    if let Some(points) = benchmark {
        series.push(PriceSeries {
            name: config.benchmark_label.clone(),
            points,
        });
    }
    series.extend(fetched);

    PriceFetch {
        table: PriceTable::join(&series),
        retained,
    }
}
