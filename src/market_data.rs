// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Narrow contract between the pipeline and a market data provider.
//!
//! The fetchers in [`crate::prices`] and [`crate::snapshot`] only talk to this
//! trait, so tests can swap in an in-memory provider. Every method is a single
//! attempt; callers decide how to degrade on failure.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse response for {symbol}: {reason}")]
    Parse { symbol: String, reason: String },

    #[error("No data for {0}")]
    NoData(String),
}

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    FiveDays,
    OneYear,
    FiveYears,
}

impl HistoryRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
    Weekly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "1wk",
        }
    }
}

/// Raw price history as returned by the provider. `adj_close` is `None` when
/// the provider did not send an adjusted column at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<Option<f64>>,
    pub adj_close: Option<Vec<Option<f64>>>,
}

impl PriceHistory {
    /// Closing prices, preferring the adjusted column, with missing values dropped
    pub fn closing_points(&self) -> Vec<(NaiveDate, f64)> {
        let column = self.adj_close.as_ref().unwrap_or(&self.close);
        self.dates
            .iter()
            .zip(column.iter())
            .filter_map(|(date, value)| match value {
                Some(v) if v.is_finite() => Some((*date, *v)),
                _ => None,
            })
            .collect()
    }
}

/// Flat map of numeric quote fields (`marketCap`, `sharesOutstanding`,
/// `regularMarketPrice`, `currentPrice`, `totalDebt`, `trailingEps`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSummary {
    pub fields: HashMap<String, f64>,
}

impl QuoteSummary {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Income,
    BalanceSheet,
}

/// Statement line items keyed by case-folded row name, each with values by period end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementIndex {
    rows: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementIndex {
    pub fn insert(&mut self, name: &str, date: NaiveDate, value: f64) {
        self.rows
            .entry(name.trim().to_lowercase())
            .or_default()
            .insert(date, value);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent period present in any row
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.rows
            .values()
            .filter_map(|values| values.keys().next_back())
            .max()
            .copied()
    }

    /// Value of `name` (case-insensitive) at `period`
    pub fn value(&self, name: &str, period: NaiveDate) -> Option<f64> {
        self.rows
            .get(&name.trim().to_lowercase())
            .and_then(|values| values.get(&period))
            .copied()
    }

    /// First alias present in the index wins, even if it has no value at `period`
    pub fn resolve(&self, aliases: &[&str], period: NaiveDate) -> Option<f64> {
        aliases
            .iter()
            .map(|alias| alias.to_lowercase())
            .find(|alias| self.rows.contains_key(alias))
            .and_then(|alias| self.value(&alias, period))
    }
}

pub trait MarketData: Send + Sync {
    fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
        interval: Interval,
    ) -> impl Future<Output = Result<PriceHistory>> + Send;

    fn quote_summary(&self, symbol: &str) -> impl Future<Output = Result<QuoteSummary>> + Send;

    fn statement(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> impl Future<Output = Result<StatementIndex>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_closing_points_prefers_adjusted() {
        let history = PriceHistory {
            dates: vec![date(2024, 1, 5), date(2024, 1, 12), date(2024, 1, 19)],
            close: vec![Some(10.0), Some(11.0), Some(12.0)],
            adj_close: Some(vec![Some(9.5), None, Some(11.5)]),
        };

        assert_eq!(
            history.closing_points(),
            vec![(date(2024, 1, 5), 9.5), (date(2024, 1, 19), 11.5)]
        );
    }

    #[test]
    fn test_closing_points_falls_back_to_close() {
        let history = PriceHistory {
            dates: vec![date(2024, 1, 5), date(2024, 1, 12)],
            close: vec![Some(f64::NAN), Some(11.0)],
            adj_close: None,
        };

        assert_eq!(history.closing_points(), vec![(date(2024, 1, 12), 11.0)]);
    }

    #[test]
    fn test_statement_index_case_folding() {
        let mut index = StatementIndex::default();
        index.insert("Total Revenue", date(2024, 3, 31), 100.0);
        index.insert("Total Revenue", date(2023, 3, 31), 90.0);
        index.insert("EBIT", date(2024, 3, 31), 20.0);

        assert_eq!(index.latest_period(), Some(date(2024, 3, 31)));
        assert_eq!(index.value("total revenue", date(2023, 3, 31)), Some(90.0));
        assert_eq!(index.value("ebit", date(2023, 3, 31)), None);
    }

    #[test]
    fn test_resolve_first_present_alias_wins() {
        let period = date(2024, 3, 31);
        let mut index = StatementIndex::default();
        index.insert("Short Term Investments", period, 5.0);
        index.insert("Other Short-Term Investments", period, 7.0);

        let aliases = [
            "other short term investments",
            "short term investments",
            "other short-term investments",
        ];
        assert_eq!(index.resolve(&aliases, period), Some(5.0));
        assert_eq!(index.resolve(&["goodwill"], period), None);
    }
}
