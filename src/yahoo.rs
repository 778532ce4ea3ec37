// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Yahoo Finance client: chart history, quote summary and annual statements.

use crate::market_data::{
    HistoryRange, Interval, MarketData, MarketDataError, PriceHistory, QuoteSummary, Result,
    StatementIndex, StatementKind,
};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const QUERY1: &str = "https://query1.finance.yahoo.com";
const QUERY2: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Modules flattened into a [`QuoteSummary`]; earlier modules win on duplicate keys
const SUMMARY_MODULES: [&str; 4] = ["financialData", "defaultKeyStatistics", "summaryDetail", "price"];

const INCOME_TYPES: [&str; 3] = ["TotalRevenue", "EBIT", "EBITDA"];

const BALANCE_TYPES: [&str; 13] = [
    "CashAndCashEquivalents",
    "RestrictedCash",
    "OtherShortTermInvestments",
    "InvestmentinFinancialAssets",
    "AvailableForSaleSecurities",
    "OtherInvestments",
    "Goodwill",
    "OtherIntangibleAssets",
    "NonCurrentDeferredTaxesAssets",
    "NonCurrentDeferredAssets",
    "FixedAssetsRevaluationReserve",
    "StockholdersEquity",
    "MinorityInterest",
];

/// Start of the statement window (2015-08-23), wide enough for four annual reports
const TIMESERIES_PERIOD1: i64 = 1_440_288_000;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseIndicator>>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseIndicator {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

pub struct YahooClient {
    client: Client,
    chart_base: String,
    summary_base: String,
    cookie_url: String,
    crumb: OnceCell<String>,
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("chart_base", &self.chart_base)
            .field("summary_base", &self.summary_base)
            .finish_non_exhaustive()
    }
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(QUERY1, QUERY2, COOKIE_URL)
    }

    /// Point the client at other hosts (used by tests against a mock server)
    pub fn with_base_urls(chart_base: &str, summary_base: &str, cookie_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            chart_base: chart_base.trim_end_matches('/').to_string(),
            summary_base: summary_base.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: OnceCell::new(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Session crumb required by the quote summary endpoint. The cookie comes
    /// from the first request and lives in the client's cookie store.
    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // The cookie host answers 404 but still sets the session cookie
                let _ = self.client.get(&self.cookie_url).send().await?;
                let crumb = self
                    .get_text(&format!("{}/v1/test/getcrumb", self.summary_base))
                    .await?;
                let crumb = crumb.trim().to_string();
                if crumb.is_empty() || crumb.contains('<') {
                    return Err(MarketDataError::NoData("crumb".to_string()));
                }
                Ok::<_, MarketDataError>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }
}

pub fn parse_chart(symbol: &str, text: &str) -> Result<PriceHistory> {
    let response: ChartResponse =
        serde_json::from_str(text).map_err(|e| MarketDataError::Parse {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        if let Some(error) = response.chart.error {
            tracing::debug!("Chart error for {}: {}", symbol, error);
        }
        return Err(MarketDataError::NoData(symbol.to_string()));
    };

    let dates: Vec<NaiveDate> = result
        .timestamp
        .iter()
        .filter_map(|ts| DateTime::<Utc>::from_timestamp(ts + result.meta.gmtoffset, 0))
        .map(|dt| dt.date_naive())
        .collect();

    let mut close = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    close.resize(dates.len(), None);

    let adj_close = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| {
            let mut values = a.adjclose;
            values.resize(dates.len(), None);
            values
        });

    Ok(PriceHistory {
        dates,
        close,
        adj_close,
    })
}

/// Numeric value of a summary field: either a bare number or `{"raw": n, "fmt": ...}`
fn raw_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}

pub fn parse_quote_summary(symbol: &str, text: &str) -> Result<QuoteSummary> {
    let json: Value = serde_json::from_str(text).map_err(|e| MarketDataError::Parse {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })?;

    let result = json
        .pointer("/quoteSummary/result/0")
        .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

    let mut summary = QuoteSummary::default();
    for module in SUMMARY_MODULES {
        let Some(Value::Object(fields)) = result.get(module) else {
            continue;
        };
        for (key, value) in fields {
            if let Some(number) = raw_number(value) {
                summary.fields.entry(key.clone()).or_insert(number);
            }
        }
    }
    Ok(summary)
}

/// `annualCashAndCashEquivalents` -> `Cash And Cash Equivalents`
pub fn humanize_type(type_name: &str) -> String {
    let name = type_name.strip_prefix("annual").unwrap_or(type_name);
    let chars: Vec<char> = name.chars().collect();

    let mut out = String::with_capacity(name.len() + 8);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        out.push(*c);
    }
    out
}

pub fn parse_timeseries(symbol: &str, text: &str) -> Result<StatementIndex> {
    let json: Value = serde_json::from_str(text).map_err(|e| MarketDataError::Parse {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })?;

    let results = json
        .pointer("/timeseries/result")
        .and_then(Value::as_array)
        .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

    let mut index = StatementIndex::default();
    for result in results {
        let Some(type_name) = result.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };
        let Some(points) = result.get(type_name).and_then(Value::as_array) else {
            continue;
        };

        let row_name = humanize_type(type_name);
        for point in points {
            let date = point
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let value = point.pointer("/reportedValue/raw").and_then(Value::as_f64);
            if let (Some(date), Some(value)) = (date, value) {
                index.insert(&row_name, date, value);
            }
        }
    }
    Ok(index)
}

impl MarketData for YahooClient {
    async fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includeAdjustedClose=true",
            self.chart_base,
            symbol,
            range.as_str(),
            interval.as_str()
        );
        let text = self.get_text(&url).await?;
        parse_chart(symbol, &text)
    }

    async fn quote_summary(&self, symbol: &str) -> Result<QuoteSummary> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.summary_base,
            symbol,
            SUMMARY_MODULES.join(","),
            crumb
        );
        let text = self.get_text(&url).await?;
        parse_quote_summary(symbol, &text)
    }

    async fn statement(&self, symbol: &str, kind: StatementKind) -> Result<StatementIndex> {
        let types: &[&str] = match kind {
            StatementKind::Income => &INCOME_TYPES,
            StatementKind::BalanceSheet => &BALANCE_TYPES,
        };
        let type_param = types
            .iter()
            .map(|t| format!("annual{}", t))
            .collect::<Vec<_>>()
            .join(",");

        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}?symbol={}&type={}&period1={}&period2={}",
            self.summary_base,
            symbol,
            symbol,
            type_param,
            TIMESERIES_PERIOD1,
            Utc::now().timestamp()
        );
        let text = self.get_text(&url).await?;
        parse_timeseries(symbol, &text)
    }
}
