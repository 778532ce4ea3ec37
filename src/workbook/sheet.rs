// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Cell-level reads and writes, header-preserving sheet writes and the beta sort.

use super::{CellValue, Dataset};
use std::collections::HashSet;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// First data row of the BETA sheet; rows 1-2 are a header block
const BETA_FIRST_ROW: u32 = 3;
/// Market cap column of the BETA sheet
const BETA_MCAP_COLUMN: u32 = 3;

/// Display text of a cell, empty when the cell does not exist
pub fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|cell| cell.get_value().to_string())
        .unwrap_or_default()
}

pub fn read_cell(sheet: &Worksheet, col: u32, row: u32) -> CellValue {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return CellValue::Empty;
    };

    let formula = cell.get_formula();
    if !formula.is_empty() {
        return CellValue::Formula(formula.to_string());
    }

    let value = cell.get_value();
    if value.is_empty() {
        return CellValue::Empty;
    }
    if cell.get_data_type() == "n" {
        if let Ok(number) = value.parse::<f64>() {
            return CellValue::Number(number);
        }
    }
    CellValue::Text(value.to_string())
}

pub fn write_cell(sheet: &mut Worksheet, col: u32, row: u32, value: &CellValue) {
    let cell = sheet.get_cell_mut((col, row));
    match value {
        CellValue::Empty => {
            cell.set_value_string("");
        }
        CellValue::Text(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Date(d) => {
            cell.set_value_string(d.format("%Y-%m-%d").to_string());
        }
        CellValue::Formula(f) => {
            cell.set_formula(f.as_str());
        }
    }
}

/// Trimmed texts of row 1 up to the last used column
pub fn header_row(sheet: &Worksheet) -> Vec<String> {
    (1..=sheet.get_highest_column())
        .map(|col| cell_text(sheet, col, 1).trim().to_string())
        .collect()
}

/// Delete every row from `first` down
fn clear_rows_from(sheet: &mut Worksheet, first: u32) {
    let last = sheet.get_highest_row();
    if last >= first {
        sheet.remove_row(&first, &(last - first + 1));
    }
}

/// Header row then data rows, in the dataset's column order. Empty cells are
/// not created.
pub fn write_fresh(sheet: &mut Worksheet, dataset: &Dataset) {
    for (c, name) in dataset.columns.iter().enumerate() {
        write_cell(sheet, c as u32 + 1, 1, &CellValue::Text(name.clone()));
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                write_cell(sheet, c as u32 + 1, r as u32 + 2, value);
            }
        }
    }
}

/// Clear the whole sheet and write it fresh
pub fn replace_sheet(sheet: &mut Worksheet, dataset: &Dataset) {
    clear_rows_from(sheet, 1);
    write_fresh(sheet, dataset);
}

/// Rewrite the data rows under the existing header row.
///
/// With `allow_new`, dataset columns missing from the header are appended to
/// it; otherwise they are dropped. Headers without a dataset column stay blank.
/// A sheet whose header row is entirely blank is written fresh.
pub fn write_keep_headers(sheet: &mut Worksheet, dataset: &Dataset, allow_new: bool) {
    let mut headers = header_row(sheet);
    if headers.iter().all(String::is_empty) {
        replace_sheet(sheet, dataset);
        return;
    }

    if allow_new {
        for name in &dataset.columns {
            if !headers.contains(name) {
                headers.push(name.clone());
                write_cell(sheet, headers.len() as u32, 1, &CellValue::Text(name.clone()));
            }
        }
    }

    clear_rows_from(sheet, 2);

    // each dataset column lands under the first header carrying its name
    let mut used = HashSet::new();
    let sources: Vec<Option<usize>> = headers
        .iter()
        .map(|h| dataset.column_index(h).filter(|i| used.insert(*i)))
        .collect();

    for (r, row) in dataset.rows.iter().enumerate() {
        for (c, source) in sources.iter().enumerate() {
            let Some(value) = source.and_then(|i| row.get(i)) else {
                continue;
            };
            if !value.is_empty() {
                write_cell(sheet, c as u32 + 1, r as u32 + 2, value);
            }
        }
    }
}

/// Stable descending sort of rows `first_row..` by the numeric value in `key_col`
pub fn sort_rows_desc(sheet: &mut Worksheet, first_row: u32, key_col: u32) {
    let last_row = sheet.get_highest_row();
    let last_col = sheet.get_highest_column();
    if last_row <= first_row {
        return;
    }

    let mut rows: Vec<(f64, Vec<CellValue>)> = (first_row..=last_row)
        .map(|row| {
            let cells: Vec<CellValue> = (1..=last_col).map(|col| read_cell(sheet, col, row)).collect();
            let key = read_cell(sheet, key_col, row).sort_key();
            (key, cells)
        })
        .collect();

    rows.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (offset, (_, cells)) in rows.iter().enumerate() {
        let row = first_row + offset as u32;
        for (c, value) in cells.iter().enumerate() {
            let col = c as u32 + 1;
            if value.is_empty() {
                clear_cell(sheet, col, row);
            } else {
                write_cell(sheet, col, row, value);
            }
        }
    }
}

/// Blank an existing cell, formula included; absent cells stay absent
fn clear_cell(sheet: &mut Worksheet, col: u32, row: u32) {
    if sheet.get_cell((col, row)).is_some() {
        sheet.get_cell_mut((col, row)).set_value_string("");
    }
}

/// Sort the `beta` sheet (any case) by market cap, largest first
pub fn sort_beta_by_mcap(book: &mut Spreadsheet) {
    let Some(name) = book
        .get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .find(|name| name.eq_ignore_ascii_case("beta"))
    else {
        return;
    };

    if let Some(sheet) = book.get_sheet_by_name_mut(&name) {
        sort_rows_desc(sheet, BETA_FIRST_ROW, BETA_MCAP_COLUMN);
    }
}
