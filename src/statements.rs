// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Profit & loss and balance sheet tables scraped from the company page.
//!
//! Scraping is best effort: every failure ends up as a missing table, never
//! as an error for the caller.

use crate::workbook::{CellValue, Dataset};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::future::Future;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0";

pub const PROFIT_LOSS_HEADING: &str = "profit & loss";
pub const BALANCE_SHEET_HEADING: &str = "balance sheet";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementTables {
    pub profit_loss: Option<Dataset>,
    pub balance_sheet: Option<Dataset>,
}

pub trait StatementSource: Send + Sync {
    /// Tables for a bare symbol (no exchange suffix)
    fn statements(&self, symbol: &str) -> impl Future<Output = StatementTables> + Send;
}

#[derive(Debug, Clone)]
pub struct ScreenerClient {
    client: Client,
    url_pattern: String,
}

impl ScreenerClient {
    /// `url_pattern` contains `{symbol}`
    pub fn new(url_pattern: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url_pattern: url_pattern.to_string(),
        })
    }

    pub fn url_for(&self, symbol: &str) -> String {
        self.url_pattern.replace("{symbol}", symbol)
    }

    async fn fetch_page(&self, symbol: &str) -> Option<String> {
        let url = self.url_for(symbol);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Statement page request failed for {}: {}", symbol, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!("Statement page for {} returned {}", symbol, response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Failed to read statement page for {}: {}", symbol, e);
                None
            }
        }
    }
}

impl StatementSource for ScreenerClient {
    async fn statements(&self, symbol: &str) -> StatementTables {
        match self.fetch_page(symbol).await {
            Some(html) => parse_statement_tables(&html),
            None => StatementTables::default(),
        }
    }
}

/// Find both statement tables in a company page
pub fn parse_statement_tables(html: &str) -> StatementTables {
    let document = Html::parse_document(html);
    StatementTables {
        profit_loss: table_after_heading(&document, PROFIT_LOSS_HEADING),
        balance_sheet: table_after_heading(&document, BALANCE_SHEET_HEADING),
    }
}

/// Concatenated, whitespace-stripped text of an element
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// First `table.data-table` following the first `<h2>` that mentions `phrase`
fn table_after_heading(document: &Html, phrase: &str) -> Option<Dataset> {
    let selector = Selector::parse("h2, table.data-table").ok()?;

    let mut heading_seen = false;
    for element in document.select(&selector) {
        if element.value().name() == "h2" {
            if !heading_seen && stripped_text(element).to_lowercase().contains(phrase) {
                heading_seen = true;
            }
        } else if heading_seen {
            return table_to_dataset(element);
        }
    }
    None
}

/// First row is the header; every other row becomes text cells of header width
fn table_to_dataset(table: ElementRef<'_>) -> Option<Dataset> {
    let row_selector = Selector::parse("tr").ok()?;
    let cell_selector = Selector::parse("th, td").ok()?;

    let mut rows: Vec<Vec<String>> = table
        .select(&row_selector)
        .map(|tr| tr.select(&cell_selector).map(stripped_text).collect())
        .collect();

    if rows.len() < 2 {
        return None;
    }

    let columns = rows.remove(0);
    let width = columns.len();
    let data = rows
        .into_iter()
        .map(|row| {
            let mut cells: Vec<CellValue> = row.into_iter().map(CellValue::Text).collect();
            cells.resize(width, CellValue::Text(String::new()));
            cells
        })
        .collect();

    Some(Dataset::new(columns, data))
}
