// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Equity reference table: symbol -> macro / sector / industry / basic industry.

use crate::error::RunError;
use crate::workbook::cell_text;
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};

const REQUIRED_COLUMNS: [&str; 5] = ["symbol", "macro", "sector", "industry", "basicindustry"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquityRow {
    pub symbol: String,
    pub macro_sector: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub basic_industry: Option<String>,
}

impl EquityRow {
    /// Classification levels from broadest to narrowest
    pub fn levels(&self) -> [Option<&str>; 4] {
        [
            self.macro_sector.as_deref(),
            self.sector.as_deref(),
            self.industry.as_deref(),
            self.basic_industry.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct EquityTable {
    rows: Vec<EquityRow>,
}

impl EquityTable {
    pub fn new(rows: Vec<EquityRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EquityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive lookup, first match wins
    pub fn find(&self, symbol: &str) -> Option<&EquityRow> {
        let wanted = symbol.trim().to_uppercase();
        self.rows.iter().find(|row| row.symbol == wanted)
    }
}

/// Lower-case and trim a header cell
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Build rows from a header and raw string records, shared by the csv and xlsx readers
fn rows_from_records(
    path: &Path,
    headers: &[String],
    records: impl Iterator<Item = Vec<String>>,
) -> Result<Vec<EquityRow>, RunError> {
    let mut index = [0usize; 5];
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| RunError::EquityFile {
                path: path.to_path_buf(),
                reason: format!("missing column '{}'", column),
            })?;
    }

    let field = |record: &[String], i: usize| record.get(index[i]).and_then(|v| non_blank(v));

    Ok(records
        .filter_map(|record| {
            let symbol = field(&record, 0)?.to_uppercase();
            Some(EquityRow {
                symbol,
                macro_sector: field(&record, 1),
                sector: field(&record, 2),
                industry: field(&record, 3),
                basic_industry: field(&record, 4),
            })
        })
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<EquityRow>, RunError> {
    let to_err = |e: csv::Error| RunError::EquityFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(to_err)?;

    let headers: Vec<String> = reader.headers().map_err(to_err)?.iter().map(normalize_header).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(to_err)?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    rows_from_records(path, &headers, records.into_iter())
}

fn read_xlsx(path: &Path) -> Result<Vec<EquityRow>, RunError> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| RunError::EquityFile {
        path: path.to_path_buf(),
        reason: format!("{:?}", e),
    })?;

    let sheet = book
        .get_sheet_collection()
        .iter()
        .next()
        .ok_or_else(|| RunError::EquityFile {
            path: path.to_path_buf(),
            reason: "workbook has no sheets".to_string(),
        })?;

    let max_col = sheet.get_highest_column();
    let max_row = sheet.get_highest_row();

    let headers: Vec<String> = (1..=max_col)
        .map(|col| normalize_header(&cell_text(sheet, col, 1)))
        .collect();

    let records = (2..=max_row).map(|row| {
        (1..=max_col)
            .map(|col| cell_text(sheet, col, row))
            .collect::<Vec<_>>()
    });

    rows_from_records(path, &headers, records)
}

/// Load the reference table. A missing file is reported before anything else
/// so the run halts without touching the network.
pub fn load_equity_table(path: &Path) -> Result<EquityTable, RunError> {
    if !path.exists() {
        return Err(RunError::MissingEquityFile(file_label(path)));
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let rows = if is_csv { read_csv(path)? } else { read_xlsx(path)? };
    tracing::info!("Loaded {} equities from {}", rows.len(), path.display());

    Ok(EquityTable::new(rows))
}

/// File name shown to the user, without the directory part
pub fn file_label(path: &Path) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
}
