// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! One end-to-end run: reference table to finished workbook.

use crate::config::Config;
use crate::error::RunError;
use crate::market_data::MarketData;
use crate::peers::select_peers;
use crate::prices::fetch_price_history;
use crate::progress::{Reporter, RunEvent};
use crate::reference::{file_label, load_equity_table};
use crate::snapshot::{fetch_peer_snapshots, snapshots_to_dataset};
use crate::statements::StatementSource;
use crate::workbook::{self, SheetPreview};
use std::sync::Mutex;

/// Everything a run reads from
pub struct RunContext<'a, M, S> {
    pub config: &'a Config,
    pub market: &'a M,
    pub statements: &'a S,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub symbol: String,
    pub file_name: String,
    pub workbook: Vec<u8>,
    pub previews: Vec<SheetPreview>,
    /// Peers that made it into the PEERS sheet, target first
    pub peers: Vec<String>,
    pub warnings: Vec<String>,
}

/// Forwards to the caller's reporter and keeps a copy of every warning
struct WarningCollector<'a> {
    inner: &'a dyn Reporter,
    warnings: Mutex<Vec<String>>,
}

impl<'a> WarningCollector<'a> {
    fn new(inner: &'a dyn Reporter) -> Self {
        Self {
            inner,
            warnings: Mutex::new(Vec::new()),
        }
    }

    fn into_warnings(self) -> Vec<String> {
        self.warnings.into_inner().unwrap_or_default()
    }
}

impl Reporter for WarningCollector<'_> {
    fn report(&self, event: RunEvent) {
        if let RunEvent::Warning { message } = &event {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(message.clone());
            }
        }
        self.inner.report(event);
    }
}

/// Trimmed and upper-cased; empty input is an error
pub fn normalize_symbol(symbol: &str) -> Result<String, RunError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(RunError::EmptySymbol);
    }
    Ok(symbol)
}

/// Peer candidates for `symbol` straight from the reference table, no network
pub fn peer_candidates(config: &Config, symbol: &str) -> Result<Vec<String>, RunError> {
    let symbol = normalize_symbol(symbol)?;
    let path = config.equity_file.as_path();
    let table = load_equity_table(path)?;
    let target = table.find(&symbol).ok_or_else(|| RunError::SymbolNotFound {
        symbol: symbol.clone(),
        file: file_label(path),
    })?;
    Ok(select_peers(&table, target, config.min_peers))
}

pub async fn run<M: MarketData, S: StatementSource>(
    ctx: &RunContext<'_, M, S>,
    symbol: &str,
    reporter: &dyn Reporter,
) -> Result<RunOutput, RunError> {
    let config = ctx.config;
    let reporter = WarningCollector::new(reporter);

    reporter.step(1, "Loading equity reference table...");
    let symbol = normalize_symbol(symbol)?;
    let candidates = peer_candidates(config, &symbol)?;
    reporter.step(
        2,
        &format!("Selected {} peer candidates for {}", candidates.len(), symbol),
    );

    reporter.step(3, "Downloading weekly price history...");
    let prices = fetch_price_history(ctx.market, config, &candidates, &symbol, &reporter).await;
    if prices.retained.is_empty() || prices.table.is_empty() {
        return Err(RunError::NoPriceHistory);
    }
    tracing::info!(
        "{} of {} candidates have price history",
        prices.retained.len(),
        candidates.len()
    );

    reporter.step(4, "Fetching fundamentals...");
    let snapshots = fetch_peer_snapshots(ctx.market, config, &prices.retained, &reporter).await;
    if snapshots.is_empty() {
        return Err(RunError::NoFundamentals);
    }

    reporter.step(5, &format!("Scraping financial statements for {}...", symbol));
    let statements = ctx.statements.statements(&symbol).await;
    if statements.profit_loss.is_none() {
        reporter.warn(format!("{}: profit & loss table not found, RAW_P_L left as is", symbol));
    }
    if statements.balance_sheet.is_none() {
        reporter.warn(format!("{}: balance sheet table not found, RAW_B_S left as is", symbol));
    }

    reporter.step(6, "Building workbook...");
    let mut book = workbook::load_template(&config.template_file)?;
    workbook::assemble(
        &mut book,
        &snapshots_to_dataset(&snapshots),
        &statements,
        &prices.table.to_dataset(),
    )?;
    let bytes = workbook::to_bytes(&book)?;
    let previews = workbook::preview(&bytes)?;

    Ok(RunOutput {
        file_name: workbook::output_file_name(&symbol),
        symbol,
        workbook: bytes,
        previews,
        peers: snapshots.into_iter().map(|s| s.symbol).collect(),
        warnings: reporter.into_warnings(),
    })
}
