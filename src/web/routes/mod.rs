// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod api;
pub mod pages;
pub mod sse;

use axum::http::StatusCode;
use uuid::Uuid;

use crate::web::state::{AppState, StoredRun};

/// Look up the latest run by id; malformed, unknown and replaced ids are all 404
pub(crate) async fn find_run(state: &AppState, id: &str) -> Result<StoredRun, StatusCode> {
    let id = Uuid::parse_str(id).map_err(|_| StatusCode::NOT_FOUND)?;
    state.get(id).await.ok_or(StatusCode::NOT_FOUND)
}
