// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use super::cell_text;
use crate::error::RunError;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Cursor;
use umya_spreadsheet::Worksheet;

/// Tabular view of one sheet for the web page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetPreview {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Blank headers become `col_{i}` (1-based); repeats get `_2`, `_3`, ...
pub fn unique_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = match header.trim() {
            "" => format!("col_{}", i + 1),
            trimmed => trimmed.to_string(),
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while seen.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

fn sheet_preview(sheet: &Worksheet) -> SheetPreview {
    let name = sheet.get_name().to_string();
    let last_row = sheet.get_highest_row();
    let last_col = sheet.get_highest_column();
    if last_row == 0 || last_col == 0 {
        return SheetPreview {
            name,
            ..Default::default()
        };
    }

    let raw_headers: Vec<String> = (1..=last_col).map(|col| cell_text(sheet, col, 1)).collect();
    let data: Vec<Vec<String>> = (2..=last_row)
        .map(|row| (1..=last_col).map(|col| cell_text(sheet, col, row)).collect())
        .collect();

    // columns with no value in any data row are dropped
    let keep: Vec<usize> = (0..last_col as usize)
        .filter(|&c| data.is_empty() || data.iter().any(|row| !row[c].is_empty()))
        .collect();

    let headers = unique_headers(&raw_headers);
    SheetPreview {
        name,
        headers: keep.iter().map(|&c| headers[c].clone()).collect(),
        rows: data
            .into_iter()
            .map(|row| keep.iter().map(|&c| row[c].clone()).collect())
            .collect(),
    }
}

/// Read serialized workbook bytes back into per-sheet previews, in sheet order
pub fn preview(bytes: &[u8]) -> Result<Vec<SheetPreview>, RunError> {
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| RunError::Workbook(format!("Failed to read workbook: {:?}", e)))?;

    Ok(book.get_sheet_collection().iter().map(sheet_preview).collect())
}
