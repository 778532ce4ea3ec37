// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Workbook assembly on top of a (possibly curated) xlsx template.

pub mod preview;
pub mod sheet;

pub use preview::{SheetPreview, preview, unique_headers};
pub use sheet::{
    cell_text, header_row, read_cell, replace_sheet, sort_beta_by_mcap, write_cell, write_fresh,
    write_keep_headers,
};

use crate::error::RunError;
use crate::statements::StatementTables;
use chrono::NaiveDate;
use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::Spreadsheet;

pub const PEERS_SHEET: &str = "PEERS";
pub const RAW_PL_SHEET: &str = "RAW_P_L";
pub const RAW_BS_SHEET: &str = "RAW_B_S";
pub const PRICE_HISTORY_SHEET: &str = "PRICE_HISTORY";

/// Sheets a synthesized template starts with
pub const TEMPLATE_SHEETS: [&str; 4] = [PEERS_SHEET, RAW_PL_SHEET, RAW_BS_SHEET, PRICE_HISTORY_SHEET];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// Formula text without the leading `=`
    Formula(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Formula(f) => format!("={}", f),
        }
    }

    /// Numeric value for sorting: numbers as is, text with thousands
    /// separators parsed, everything else (and NaN) is negative infinity
    pub fn sort_key(&self) -> f64 {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .unwrap_or(f64::NEG_INFINITY),
            _ => f64::NEG_INFINITY,
        };
        if value.is_nan() { f64::NEG_INFINITY } else { value }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(n) if n.is_finite() => Self::Number(n),
            _ => Self::Empty,
        }
    }
}

/// A named-column table, the common input of every sheet writer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetPolicy {
    /// Keep the existing header row; optionally append unknown columns
    KeepHeaders { allow_new: bool },
    /// Drop everything and write header plus rows
    Replace,
}

fn workbook_error(context: &str, e: impl std::fmt::Debug) -> RunError {
    RunError::Workbook(format!("{}: {:?}", context, e))
}

/// Empty workbook with the four standard sheets
pub fn new_template() -> Result<Spreadsheet, RunError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for name in TEMPLATE_SHEETS {
        book.new_sheet(name)
            .map_err(|e| workbook_error("Failed to add sheet", e))?;
    }
    Ok(book)
}

/// Read the template if present, otherwise synthesize the minimal one
pub fn load_template(path: &Path) -> Result<Spreadsheet, RunError> {
    if !path.exists() {
        tracing::info!("No template at {}, starting from a blank workbook", path.display());
        return new_template();
    }
    umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| workbook_error(&format!("Failed to read {}", path.display()), e))
}

/// Write `dataset` into sheet `name` following `policy`; a missing sheet is
/// created and written fresh
pub fn write_dataset(
    book: &mut Spreadsheet,
    name: &str,
    dataset: &Dataset,
    policy: SheetPolicy,
) -> Result<(), RunError> {
    if let Some(sheet) = book.get_sheet_by_name_mut(name) {
        match policy {
            SheetPolicy::KeepHeaders { allow_new } => write_keep_headers(sheet, dataset, allow_new),
            SheetPolicy::Replace => replace_sheet(sheet, dataset),
        }
        return Ok(());
    }

    let sheet = book
        .new_sheet(name)
        .map_err(|e| workbook_error("Failed to add sheet", e))?;
    write_fresh(sheet, dataset);
    Ok(())
}

/// Put every dataset of a run into the workbook. Missing statement tables
/// leave their sheets untouched.
pub fn assemble(
    book: &mut Spreadsheet,
    peers: &Dataset,
    statements: &StatementTables,
    prices: &Dataset,
) -> Result<(), RunError> {
    write_dataset(book, PEERS_SHEET, peers, SheetPolicy::KeepHeaders { allow_new: true })?;

    if let Some(pl) = &statements.profit_loss {
        write_dataset(book, RAW_PL_SHEET, pl, SheetPolicy::KeepHeaders { allow_new: false })?;
    }
    if let Some(bs) = &statements.balance_sheet {
        write_dataset(book, RAW_BS_SHEET, bs, SheetPolicy::KeepHeaders { allow_new: false })?;
    }

    write_dataset(book, PRICE_HISTORY_SHEET, prices, SheetPolicy::Replace)?;
    sort_beta_by_mcap(book);
    Ok(())
}

pub fn to_bytes(book: &Spreadsheet) -> Result<Vec<u8>, RunError> {
    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut cursor)
        .map_err(|e| workbook_error("Failed to serialize workbook", e))?;
    Ok(cursor.into_inner())
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect()
}

/// `{SYMBOL}_DCF_Comps_Valuation_Tool.xlsx`
pub fn output_file_name(symbol: &str) -> String {
    format!("{}_DCF_Comps_Valuation_Tool.xlsx", symbol)
}
