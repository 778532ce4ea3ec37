// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests for the web interface
//!
//! Requests go straight through the router; no socket is opened and no
//! provider is contacted.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use dcf_comps::config::Config;
use dcf_comps::pipeline::RunOutput;
use dcf_comps::statements::ScreenerClient;
use dcf_comps::web::{AppState, create_app};
use dcf_comps::workbook;
use dcf_comps::yahoo::YahooClient;
use std::time::Duration;
use tower::ServiceExt;

fn test_state() -> AppState {
    let unreachable = "http://127.0.0.1:9";
    let market = YahooClient::with_base_urls(unreachable, unreachable, unreachable).unwrap();
    let statements = ScreenerClient::new(unreachable, Duration::from_secs(1)).unwrap();
    AppState::new(Config::default(), market, statements)
}

fn sample_output(symbol: &str) -> RunOutput {
    let book = workbook::new_template().unwrap();
    let bytes = workbook::to_bytes(&book).unwrap();
    RunOutput {
        symbol: symbol.to_string(),
        file_name: workbook::output_file_name(symbol),
        previews: workbook::preview(&bytes).unwrap(),
        workbook: bytes,
        peers: vec![symbol.to_string(), "INFY".to_string()],
        warnings: vec!["WIPRO: No data for WIPRO.NS".to_string()],
    }
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = create_app(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

/// Test that the health check works
#[tokio::test]
async fn test_health_check() {
    let (status, _, body) = get(&test_state(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
}

/// Test that the symbol form loads with its default
#[tokio::test]
async fn test_index_loads() {
    let (status, _, body) = get(&test_state(), "/").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Run Model"));
    assert!(html.contains(r#"value="TCS""#));
}

#[tokio::test]
async fn test_unknown_runs_are_not_found() {
    let state = test_state();
    let random = uuid::Uuid::new_v4();

    for uri in [
        format!("/runs/{}", random),
        format!("/runs/{}/download", random),
        format!("/api/runs/{}", random),
        "/runs/not-a-uuid".to_string(),
    ] {
        let (status, _, _) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_stored_run_pages() {
    let state = test_state();
    let id = state.store(sample_output("TCS")).await;

    let (status, _, body) = get(&state, &format!("/runs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    for sheet in ["PEERS", "RAW_P_L", "RAW_B_S", "PRICE_HISTORY"] {
        assert!(html.contains(sheet), "{} tab missing", sheet);
    }
    assert!(html.contains("TCS_DCF_Comps_Valuation_Tool.xlsx"));

    let (status, _, body) = get(&state, &format!("/api/runs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["symbol"], "TCS");
    assert_eq!(json["peers"][1], "INFY");
    assert_eq!(json["sheets"].as_array().unwrap().len(), 4);
    assert_eq!(json["warnings"][0], "WIPRO: No data for WIPRO.NS");
}

#[tokio::test]
async fn test_download_is_an_xlsx_attachment() {
    let state = test_state();
    let output = sample_output("INFY");
    let expected = output.workbook.clone();
    let id = state.store(output).await;

    let (status, headers, body) = get(&state, &format!("/runs/{}/download", id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        r#"attachment; filename="INFY_DCF_Comps_Valuation_Tool.xlsx""#
    );
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_new_run_replaces_previous() {
    let state = test_state();
    let old = state.store(sample_output("TCS")).await;
    let new = state.store(sample_output("INFY")).await;

    let (status, _, _) = get(&state, &format!("/runs/{}", old)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&state, &format!("/runs/{}", new)).await;
    assert_eq!(status, StatusCode::OK);
}
