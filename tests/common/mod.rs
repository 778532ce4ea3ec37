// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Common test utilities and helpers
//!
//! In-memory market data and statement sources, plus reference table and
//! config builders rooted in a temporary directory.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use dcf_comps::config::Config;
use dcf_comps::market_data::{
    HistoryRange, Interval, MarketData, MarketDataError, PriceHistory, QuoteSummary, Result,
    StatementIndex, StatementKind,
};
use dcf_comps::statements::{StatementSource, StatementTables};
use std::collections::HashMap;
use std::path::Path;

/// Market data served from maps keyed by provider symbol (`TCS.NS`).
/// Anything missing answers `NoData`.
#[derive(Debug, Default)]
pub struct FakeMarket {
    pub weekly: HashMap<String, PriceHistory>,
    pub daily: HashMap<String, PriceHistory>,
    pub recent: HashMap<String, PriceHistory>,
    pub summaries: HashMap<String, QuoteSummary>,
    pub income: HashMap<String, StatementIndex>,
    pub balance: HashMap<String, StatementIndex>,
}

impl FakeMarket {
    /// Weekly history, quote summary and statements for a healthy listed symbol
    pub fn with_listed(mut self, market_symbol: &str, weeks: usize, price: f64) -> Self {
        self.weekly
            .insert(market_symbol.to_string(), weekly_history(weeks, price));
        self.summaries.insert(
            market_symbol.to_string(),
            summary(&[
                ("marketCap", price * 1e9),
                ("sharesOutstanding", 1e9),
                ("totalDebt", 5e8),
                ("regularMarketPrice", price),
                ("trailingEps", price / 25.0),
            ]),
        );
        self.income
            .insert(market_symbol.to_string(), income_statement(price * 1e8));
        self.balance
            .insert(market_symbol.to_string(), balance_sheet(price * 1e7));
        self
    }

    pub fn with_weekly(mut self, market_symbol: &str, weeks: usize, price: f64) -> Self {
        self.weekly
            .insert(market_symbol.to_string(), weekly_history(weeks, price));
        self
    }
}

impl MarketData for FakeMarket {
    async fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let source = match (range, interval) {
            (HistoryRange::FiveYears, Interval::Weekly) => &self.weekly,
            (HistoryRange::OneYear, Interval::Daily) => &self.daily,
            _ => &self.recent,
        };
        source
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))
    }

    async fn quote_summary(&self, symbol: &str) -> Result<QuoteSummary> {
        self.summaries
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))
    }

    async fn statement(&self, symbol: &str, kind: StatementKind) -> Result<StatementIndex> {
        let source = match kind {
            StatementKind::Income => &self.income,
            StatementKind::BalanceSheet => &self.balance,
        };
        Ok(source.get(symbol).cloned().unwrap_or_default())
    }
}

/// Statement tables handed out as-is for every symbol
#[derive(Debug, Default)]
pub struct FakeStatements {
    pub tables: StatementTables,
}

impl StatementSource for FakeStatements {
    async fn statements(&self, _symbol: &str) -> StatementTables {
        self.tables.clone()
    }
}

pub fn first_friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 6).unwrap()
}

/// `weeks` Friday closes starting at `first_friday`, drifting upwards
pub fn weekly_history(weeks: usize, price: f64) -> PriceHistory {
    let dates: Vec<NaiveDate> = (0..weeks)
        .map(|w| first_friday() + Duration::weeks(w as i64))
        .collect();
    let close = (0..weeks).map(|w| Some(price + w as f64)).collect();
    PriceHistory {
        dates,
        close,
        adj_close: None,
    }
}

pub fn summary(fields: &[(&str, f64)]) -> QuoteSummary {
    QuoteSummary {
        fields: fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

pub fn fiscal_year_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

pub fn income_statement(revenue: f64) -> StatementIndex {
    let mut index = StatementIndex::default();
    index.insert("Total Revenue", fiscal_year_end(), revenue);
    index.insert("EBIT", fiscal_year_end(), revenue * 0.25);
    index.insert("EBITDA", fiscal_year_end(), revenue * 0.3);
    index
}

pub fn balance_sheet(cash: f64) -> StatementIndex {
    let mut index = StatementIndex::default();
    index.insert("Cash And Cash Equivalents", fiscal_year_end(), cash);
    index.insert("Goodwill", fiscal_year_end(), cash / 10.0);
    index.insert("Stockholders Equity", fiscal_year_end(), cash * 5.0);
    index
}

/// Reference table csv with the standard header
pub fn write_equity_csv(path: &Path, rows: &[[&str; 5]]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["Symbol", "Macro", "Sector", "Industry", "BasicIndustry"])
        .unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();
}

/// Defaults with every file rooted in `dir`; the template does not exist yet
pub fn test_config(dir: &Path) -> Config {
    Config {
        equity_file: dir.join("EQUITY_Final.csv"),
        template_file: dir.join("DCF_Template.xlsx"),
        output_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

/// `TCS` plus twelve IT peers sharing every classification level
pub fn it_sector_rows() -> Vec<[&'static str; 5]> {
    let mut rows = vec![["TCS", "Information Technology", "IT", "IT - Software", "Computers - Software & Consulting"]];
    for symbol in IT_PEERS {
        rows.push([symbol, "Information Technology", "IT", "IT - Software", "Computers - Software & Consulting"]);
    }
    rows
}

pub const IT_PEERS: [&str; 12] = [
    "INFY", "WIPRO", "HCLTECH", "TECHM", "LTIM", "PERSISTENT", "COFORGE", "MPHASIS", "OFSS",
    "TATAELXSI", "KPITTECH", "LTTS",
];
