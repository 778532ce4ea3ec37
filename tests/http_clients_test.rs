// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Provider clients against a mock HTTP server

use approx::assert_relative_eq;
use chrono::NaiveDate;
use dcf_comps::market_data::{HistoryRange, Interval, MarketData, MarketDataError, StatementKind};
use dcf_comps::statements::{ScreenerClient, StatementSource, StatementTables};
use dcf_comps::workbook::CellValue;
use dcf_comps::yahoo::YahooClient;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART: &str = r#"{"chart":{"result":[{"meta":{"gmtoffset":19800},
    "timestamp":[1704412800,1705017600,1705622400],
    "indicators":{"quote":[{"close":[3700.5,3712.0,null]}],
                  "adjclose":[{"adjclose":[3650.0,3690.25,null]}]}}],"error":null}}"#;

const SUMMARY: &str = r#"{"quoteSummary":{"result":[{
    "financialData":{"currentPrice":{"raw":3800.0},"totalDebt":{"raw":8.1e10}},
    "defaultKeyStatistics":{"sharesOutstanding":{"raw":3.6e9}},
    "price":{"regularMarketPrice":{"raw":3801.2}}
}],"error":null}}"#;

const TIMESERIES: &str = r#"{"timeseries":{"result":[
    {"meta":{"type":["annualTotalRevenue"]},
     "annualTotalRevenue":[
        {"asOfDate":"2023-03-31","reportedValue":{"raw":2.25e12}},
        {"asOfDate":"2024-03-31","reportedValue":{"raw":2.40e12}}]},
    {"meta":{"type":["annualEBITDA"]},
     "annualEBITDA":[{"asOfDate":"2024-03-31","reportedValue":{"raw":6.5e11}}]}
]}}"#;

fn yahoo(server: &MockServer) -> YahooClient {
    YahooClient::with_base_urls(
        &server.uri(),
        &server.uri(),
        &format!("{}/cookie", server.uri()),
    )
    .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_chart_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TCS.NS"))
        .and(query_param("range", "5y"))
        .and(query_param("interval", "1wk"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHART))
        .expect(1)
        .mount(&server)
        .await;

    let history = yahoo(&server)
        .history("TCS.NS", HistoryRange::FiveYears, Interval::Weekly)
        .await
        .unwrap();

    let points = history.closing_points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].0, date(2024, 1, 5));
    assert_relative_eq!(points[1].1, 3690.25);
}

#[tokio::test]
async fn test_chart_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/GONE.NS"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = yahoo(&server)
        .history("GONE.NS", HistoryRange::OneYear, Interval::Daily)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketDataError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_quote_summary_fetches_crumb_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cookie"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc123"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/TCS.NS"))
        .and(query_param("crumb", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUMMARY))
        .expect(2)
        .mount(&server)
        .await;

    let client = yahoo(&server);
    let first = client.quote_summary("TCS.NS").await.unwrap();
    let second = client.quote_summary("TCS.NS").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("totalDebt"), Some(8.1e10));
    assert_eq!(first.get("sharesOutstanding"), Some(3.6e9));
    assert_eq!(first.get("regularMarketPrice"), Some(3801.2));
}

#[tokio::test]
async fn test_income_statement_timeseries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/fundamentals-timeseries/v1/finance/timeseries/TCS.NS"))
        .and(query_param("symbol", "TCS.NS"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TIMESERIES))
        .mount(&server)
        .await;

    let index = yahoo(&server)
        .statement("TCS.NS", StatementKind::Income)
        .await
        .unwrap();

    let latest = index.latest_period().unwrap();
    assert_eq!(latest, date(2024, 3, 31));
    assert_eq!(index.value("total revenue", latest), Some(2.40e12));
    assert_eq!(index.value("EBITDA", latest), Some(6.5e11));
}

fn screener(server: &MockServer) -> ScreenerClient {
    ScreenerClient::new(
        &format!("{}/company/{{symbol}}/consolidated/", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_statement_page_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company/NOPE/consolidated/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h2>Profit &amp; Loss</h2>"))
        .mount(&server)
        .await;

    let tables = screener(&server).statements("NOPE").await;

    assert_eq!(tables, StatementTables::default());
}

#[tokio::test]
async fn test_statement_page_tables() {
    let page = r#"<html><body>
        <h2>Profit &amp; Loss</h2>
        <table class="data-table">
          <tr><th></th><th>Mar 2023</th><th>Mar 2024</th></tr>
          <tr><td>Sales</td><td>2,25,458</td><td>2,40,893</td></tr>
        </table>
        <h2>Balance Sheet</h2>
        <table class="data-table">
          <tr><th></th><th>Mar 2024</th></tr>
          <tr><td>Reserves</td><td>94,394</td></tr>
        </table>
      </body></html>"#;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company/TCS/consolidated/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let tables = screener(&server).statements("TCS").await;

    let pl = tables.profit_loss.unwrap();
    assert_eq!(pl.columns, vec!["", "Mar 2023", "Mar 2024"]);
    assert_eq!(pl.rows[0][0], CellValue::Text("Sales".to_string()));
    let bs = tables.balance_sheet.unwrap();
    assert_eq!(bs.rows[0][1], CellValue::Text("94,394".to_string()));
}
