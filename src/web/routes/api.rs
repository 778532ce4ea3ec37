// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::web::{routes::find_run, state::AppState};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Summary of a finished run
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let run = find_run(&state, &id).await?;
    let output = &run.output;

    Ok(Json(json!({
        "id": run.id,
        "symbol": output.symbol,
        "file_name": output.file_name,
        "peers": output.peers,
        "sheets": output.previews.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "warnings": output.warnings,
    })))
}

/// The generated workbook as an attachment
pub async fn download_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    let run = find_run(&state, &id).await?;
    let disposition = format!("attachment; filename=\"{}\"", run.output.file_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        run.output.workbook,
    )
        .into_response())
}
