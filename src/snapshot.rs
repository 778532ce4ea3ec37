// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Point-in-time fundamentals for each peer.
//!
//! Balance sheet fields are looked up by alias because the provider names
//! the same line item differently across companies. A field with no matching
//! alias is simply `None`.

use crate::config::Config;
use crate::market_data::{
    HistoryRange, Interval, MarketData, MarketDataError, QuoteSummary, StatementIndex, StatementKind,
};
use crate::progress::Reporter;
use crate::workbook::{CellValue, Dataset};
use serde::Serialize;

pub const CASH_AND_EQUIVALENTS: &[&str] = &["cash and cash equivalents", "cash & cash equivalents"];
pub const RESTRICTED_CASH: &[&str] = &["restricted cash"];
pub const OTHER_SHORT_TERM_INVESTMENTS: &[&str] = &[
    "other short term investments",
    "short term investments",
    "other short-term investments",
];
pub const INVESTMENT_IN_FINANCIAL_ASSETS: &[&str] = &[
    "investment in financial assets",
    "investmentin financial assets",
    "investments in financial assets",
];
pub const AVAILABLE_FOR_SALE: &[&str] = &["available for sale securities", "available-for-sale securities"];
pub const OTHER_INVESTMENTS: &[&str] = &["other investments"];
pub const GOODWILL: &[&str] = &["goodwill"];
pub const OTHER_INTANGIBLES: &[&str] = &[
    "other intangible assets",
    "intangible assets other",
    "intangible assets",
];
pub const DEFERRED_TAX_ASSETS: &[&str] = &["deferred tax assets", "non current deferred taxes assets"];
pub const NON_CURRENT_DEFERRED_ASSETS: &[&str] = &[
    "non-current deferred assets",
    "non current deferred assets",
    "deferred assets non current",
];
pub const REVALUATION_RESERVE: &[&str] = &["fixed assets revaluation reserve", "fixed asset revaluation reserve"];
pub const STOCKHOLDERS_EQUITY: &[&str] = &[
    "stockholders equity",
    "total stockholders equity",
    "shareholders equity",
    "total equity",
];
pub const MINORITY_INTEREST: &[&str] = &["minority interest", "noncontrolling interest", "non controlling interest"];

/// Column headers of the PEERS sheet, in field order
pub const SNAPSHOT_COLUMNS: [&str; 22] = [
    "Symbol",
    "Market Cap",
    "No. of Shares",
    "Current Price",
    "Total Revenue",
    "EBIT",
    "EBITDA",
    "Cash and Cash Equivalents",
    "Restricted Cash",
    "Other Short Term Investments",
    "Investment in Financial Assets",
    "Available For Sale Securities",
    "Other Investments",
    "Goodwill",
    "Other Intangible Assets",
    "Deferred Tax Assets",
    "Non-Current Deferred Assets",
    "Fixed Asset Revaluation Reserve",
    "Stockholders Equity",
    "Minority Interest",
    "Total Debt",
    "Diluted EPS",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub market_cap: Option<f64>,
    pub shares: Option<f64>,
    pub current_price: Option<f64>,
    pub total_revenue: Option<f64>,
    pub ebit: Option<f64>,
    pub ebitda: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub restricted_cash: Option<f64>,
    pub other_short_term_investments: Option<f64>,
    pub investment_in_financial_assets: Option<f64>,
    pub available_for_sale: Option<f64>,
    pub other_investments: Option<f64>,
    pub goodwill: Option<f64>,
    pub other_intangibles: Option<f64>,
    pub deferred_tax_assets: Option<f64>,
    pub non_current_deferred_assets: Option<f64>,
    pub revaluation_reserve: Option<f64>,
    pub stockholders_equity: Option<f64>,
    pub minority_interest: Option<f64>,
    pub total_debt: Option<f64>,
    pub diluted_eps: Option<f64>,
}

impl Snapshot {
    /// Record carrying only the symbol; what a failed fetch degrades to
    pub fn stub(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    /// Total debt and share count are needed for the valuation multiples
    pub fn has_required_fields(&self) -> bool {
        self.total_debt.is_some() && self.shares.is_some()
    }

    /// Values in [`SNAPSHOT_COLUMNS`] order
    pub fn values(&self) -> Vec<CellValue> {
        let numbers = [
            self.market_cap,
            self.shares,
            self.current_price,
            self.total_revenue,
            self.ebit,
            self.ebitda,
            self.cash_and_equivalents,
            self.restricted_cash,
            self.other_short_term_investments,
            self.investment_in_financial_assets,
            self.available_for_sale,
            self.other_investments,
            self.goodwill,
            self.other_intangibles,
            self.deferred_tax_assets,
            self.non_current_deferred_assets,
            self.revaluation_reserve,
            self.stockholders_equity,
            self.minority_interest,
            self.total_debt,
            self.diluted_eps,
        ];

        let mut values = Vec::with_capacity(SNAPSHOT_COLUMNS.len());
        values.push(CellValue::Text(self.symbol.clone()));
        values.extend(numbers.into_iter().map(CellValue::from));
        values
    }
}

pub fn snapshots_to_dataset(snapshots: &[Snapshot]) -> Dataset {
    Dataset::new(
        SNAPSHOT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        snapshots.iter().map(Snapshot::values).collect(),
    )
}

/// Zero is treated as "no price" like a missing quote
fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p != 0.0)
}

/// Real-time quote, then general info, then the last close of the past five days
async fn current_price<M: MarketData>(market: &M, market_symbol: &str, summary: &QuoteSummary) -> Option<f64> {
    if let Some(price) = usable_price(summary.get("regularMarketPrice")) {
        return Some(price);
    }
    if let Some(price) = usable_price(summary.get("currentPrice")) {
        return Some(price);
    }
    match market
        .history(market_symbol, HistoryRange::FiveDays, Interval::Daily)
        .await
    {
        Ok(history) => usable_price(history.closing_points().last().map(|(_, close)| *close)),
        Err(e) => {
            tracing::debug!("{}: no recent close: {}", market_symbol, e);
            None
        }
    }
}

/// Assemble a snapshot from already-fetched provider data
pub fn build_snapshot(
    symbol: &str,
    summary: &QuoteSummary,
    income: &StatementIndex,
    balance: &StatementIndex,
    current_price: Option<f64>,
) -> Snapshot {
    let mut snapshot = Snapshot {
        symbol: symbol.to_string(),
        market_cap: summary.get("marketCap"),
        shares: summary.get("sharesOutstanding"),
        current_price,
        total_debt: summary.get("totalDebt"),
        diluted_eps: summary.get("trailingEps"),
        ..Snapshot::default()
    };

    // balance sheet items are read at the latest income statement period
    let Some(period) = income.latest_period() else {
        return snapshot;
    };

    snapshot.total_revenue = income.value("total revenue", period);
    snapshot.ebit = income.value("ebit", period);
    snapshot.ebitda = income.value("ebitda", period);

    snapshot.cash_and_equivalents = balance.resolve(CASH_AND_EQUIVALENTS, period);
    snapshot.restricted_cash = balance.resolve(RESTRICTED_CASH, period);
    snapshot.other_short_term_investments = balance.resolve(OTHER_SHORT_TERM_INVESTMENTS, period);
    snapshot.investment_in_financial_assets = balance.resolve(INVESTMENT_IN_FINANCIAL_ASSETS, period);
    snapshot.available_for_sale = balance.resolve(AVAILABLE_FOR_SALE, period);
    snapshot.other_investments = balance.resolve(OTHER_INVESTMENTS, period);
    snapshot.goodwill = balance.resolve(GOODWILL, period);
    snapshot.other_intangibles = balance.resolve(OTHER_INTANGIBLES, period);
    snapshot.deferred_tax_assets = balance.resolve(DEFERRED_TAX_ASSETS, period);
    snapshot.non_current_deferred_assets = balance.resolve(NON_CURRENT_DEFERRED_ASSETS, period);
    snapshot.revaluation_reserve = balance.resolve(REVALUATION_RESERVE, period);
    snapshot.stockholders_equity = balance.resolve(STOCKHOLDERS_EQUITY, period);
    snapshot.minority_interest = balance.resolve(MINORITY_INTEREST, period);

    snapshot
}

async fn try_fetch_snapshot<M: MarketData>(
    market: &M,
    symbol: &str,
    market_symbol: &str,
) -> Result<Snapshot, MarketDataError> {
    let summary = market.quote_summary(market_symbol).await?;
    let income = market.statement(market_symbol, StatementKind::Income).await?;
    let balance = market
        .statement(market_symbol, StatementKind::BalanceSheet)
        .await?;
    let price = current_price(market, market_symbol, &summary).await;

    Ok(build_snapshot(symbol, &summary, &income, &balance, price))
}

/// Fetch one snapshot. Any failure degrades to a symbol-only record.
pub async fn fetch_snapshot<M: MarketData>(
    market: &M,
    config: &Config,
    symbol: &str,
    reporter: &dyn Reporter,
) -> Snapshot {
    let market_symbol = config.market_symbol(symbol);
    match try_fetch_snapshot(market, symbol, &market_symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            reporter.warn(format!("{}: {}", symbol, e));
            Snapshot::stub(symbol)
        }
    }
}

/// Snapshots for every peer, in order, then drop the ones missing total debt
/// or share count.
pub async fn fetch_peer_snapshots<M: MarketData>(
    market: &M,
    config: &Config,
    peers: &[String],
    reporter: &dyn Reporter,
) -> Vec<Snapshot> {
    let mut snapshots = Vec::with_capacity(peers.len());
    for (i, symbol) in peers.iter().enumerate() {
        reporter.progress(i + 1, peers.len(), symbol);
        snapshots.push(fetch_snapshot(market, config, symbol, reporter).await);
    }
    filter_required(snapshots)
}

pub fn filter_required(snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
    snapshots
        .into_iter()
        .filter(|s| {
            let keep = s.has_required_fields();
            if !keep {
                tracing::info!("Dropping {}: missing total debt or share count", s.symbol);
            }
            keep
        })
        .collect()
}
