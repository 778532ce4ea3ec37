// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};

use crate::web::{routes::find_run, state::AppState};
use crate::workbook::SheetPreview;

const DEFAULT_SYMBOL: &str = "TCS";

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    title: String,
    default_symbol: String,
}

/// Symbol form with live progress
pub async fn index(State(_state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let template = IndexTemplate {
        title: "DCF & Comps Valuation".to_string(),
        default_symbol: DEFAULT_SYMBOL.to_string(),
    };

    Ok(Html(
        template
            .render()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    ))
}

#[derive(Template)]
#[template(path = "run.html")]
struct RunTemplate {
    title: String,
    id: String,
    symbol: String,
    file_name: String,
    peers: Vec<String>,
    warnings: Vec<String>,
    sheets: Vec<SheetPreview>,
}

/// Tabbed preview of every sheet plus the download link
pub async fn run_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let run = find_run(&state, &id).await?;
    let output = run.output;

    let template = RunTemplate {
        title: format!("{} valuation workbook", output.symbol),
        id: run.id.to_string(),
        symbol: output.symbol,
        file_name: output.file_name,
        peers: output.peers,
        warnings: output.warnings,
        sheets: output.previews,
    };

    Ok(Html(
        template
            .render()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    ))
}
