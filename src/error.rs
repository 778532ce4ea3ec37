// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Errors that halt a workbook run.
//!
//! Everything here is user-visible: the message is what the CLI prints and
//! what the web page shows. Per-peer failures never become a `RunError`; they
//! are reported as warnings and the peer is dropped instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Enter a symbol.")]
    EmptySymbol,

    #[error("Missing {} in this folder.", .0.display())]
    MissingEquityFile(PathBuf),

    #[error("Failed to read {}: {reason}", .path.display())]
    EquityFile { path: PathBuf, reason: String },

    #[error("{symbol} not found in {}.", .file.display())]
    SymbolNotFound { symbol: String, file: PathBuf },

    #[error("No peers have sufficient price history. Try another symbol.")]
    NoPriceHistory,

    #[error("Peers with price history failed fundamentals filter.")]
    NoFundamentals,

    #[error("Workbook error: {0}")]
    Workbook(String),
}
