use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::Path;
use tracing::debug;
use umya_spreadsheet::Worksheet;

/// One data row: column name to raw cell text.
pub type Row = IndexMap<String, String>;

/// A named table read from one worksheet.
///
/// The first worksheet row provides the column names; every following row
/// becomes a [`Row`]. Cells that are missing in the file read as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    /// The worksheet name.
    pub name: String,
    /// Column names in worksheet order.
    pub columns: Vec<String>,
    /// Data rows, top to bottom.
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Creates a new, empty `Sheet`.
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Sheet {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds a row of cells, paired positionally with the column names.
    ///
    /// A repeated column name keeps its first position and the later cell.
    /// Surplus cells are dropped; missing cells read as `""`.
    pub fn add_row(&mut self, cells: &[&str]) {
        let mut row = Row::new();
        for (index, column) in self.columns.iter().enumerate() {
            let value = cells.get(index).copied().unwrap_or_default();
            row.insert(column.clone(), value.to_string());
        }
        self.rows.push(row);
    }

    /// Returns true if the sheet declares the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Reads every worksheet of an `.xlsx` workbook, in workbook order.
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("Failed to read workbook {}", path.display()))?;

    let sheets = book
        .get_sheet_collection()
        .iter()
        .map(read_worksheet)
        .collect::<Vec<_>>();
    debug!("Read {} sheet(s) from {}", sheets.len(), path.display());
    Ok(sheets)
}

fn read_worksheet(worksheet: &Worksheet) -> Sheet {
    // umya_spreadsheet is 1-based for rows and columns
    let (max_col, max_row) = worksheet.get_highest_column_and_row();

    let columns: Vec<String> = (1..=max_col)
        .map(|col| worksheet.get_value((col, 1)))
        .collect();
    let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    let mut sheet = Sheet::new(worksheet.get_name(), &column_refs);

    for row in 2..=max_row {
        let cells: Vec<String> = (1..=max_col)
            .map(|col| worksheet.get_value((col, row)))
            .collect();
        let cell_refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        sheet.add_row(&cell_refs);
    }
    sheet
}
