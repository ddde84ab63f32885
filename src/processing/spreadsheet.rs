use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;

use crate::table::{column_names, TableRow};

pub const SHEET_NAME: &str = "Scenes";

/// Write `rows` to a single-sheet XLSX workbook at `path`.
///
/// The header row lists columns in first-seen order. Numbers and booleans
/// keep their cell type, nulls are left blank and nested values are written
/// as JSON text.
pub fn write_table_xlsx(rows: &[TableRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let columns = column_names(rows);
    for (col_idx, column) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, column, &header_format)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = row_idx as u32 + 1;
        for (col_idx, column) in columns.iter().enumerate() {
            if let Some(value) = row.get(column) {
                write_cell(worksheet, sheet_row, col_idx as u16, value)?;
            }
        }
    }
    worksheet.autofit();

    workbook
        .save(path)
        .with_context(|| format!("Failed to write spreadsheet {}", path.display()))?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        Value::Number(number) => match number.as_f64() {
            Some(num) => {
                worksheet.write_number(row, col, num)?;
            }
            None => {
                worksheet.write_string(row, col, number.to_string())?;
            }
        },
        Value::String(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Value::Array(_) | Value::Object(_) => {
            worksheet.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}
