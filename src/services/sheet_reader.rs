//! Spreadsheet reader
//!
//! Turns uploaded workbook bytes into a header index plus data rows. Only the
//! first worksheet that contains any cells is read; header names are matched
//! exactly after trimming.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::SheetError;

/// A single cell value, detached from the spreadsheet library
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text, `None` when blank
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            // Whole numbers read back without a trailing ".0" (phone numbers, zips)
            Cell::Number(f) if f.is_finite() && *f == f.trunc() && f.abs() < 1e15 => {
                Some(format!("{}", *f as i64))
            }
            Cell::Number(f) if f.is_finite() => Some(f.to_string()),
            Cell::Number(_) => None,
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Numeric value from a number cell or numeric text; NaN/inf read as absent
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(f) => Some(*f),
            Cell::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<f64>()
                    .ok()
                    .or_else(|| trimmed.replace(',', "").parse::<f64>().ok())
            }
            Cell::Empty | Cell::Bool(_) => None,
        };
        value.filter(|f| f.is_finite())
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Header text → zero-based column index
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_header(header: &[Cell]) -> Self {
        let mut columns = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            // Duplicate headers: last one wins
            if let Some(name) = cell.as_text() {
                columns.insert(name, idx);
            }
        }
        Self { columns }
    }

    pub fn get(&self, header: &str) -> Option<usize> {
        self.columns.get(header).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One data row with its 1-based spreadsheet row number
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    pub fn cell(&self, column: usize) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Empty)
    }

    /// Cell under `header`, or `Cell::Empty` when the header is absent
    pub fn get(&self, columns: &ColumnMap, header: &str) -> &Cell {
        match columns.get(header) {
            Some(column) => self.cell(column),
            None => &Cell::Empty,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

/// Parsed worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub columns: ColumnMap,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    /// Build a sheet from a grid whose first row is the header.
    ///
    /// `first_row_number` is the 1-based row number of the header; entirely
    /// blank data rows are skipped.
    pub fn from_grid(name: impl Into<String>, first_row_number: usize, grid: Vec<Vec<Cell>>) -> Self {
        let mut grid = grid.into_iter();
        let columns = grid
            .next()
            .map(|header| ColumnMap::from_header(&header))
            .unwrap_or_default();

        let rows = grid
            .enumerate()
            .map(|(idx, cells)| SheetRow {
                number: first_row_number + idx + 1,
                cells,
            })
            .filter(|row| !row.is_blank())
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }
}

/// Read the first non-empty worksheet of an xlsx/xls/xlsm/ods workbook
pub fn read_workbook(bytes: &[u8]) -> Result<Sheet, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SheetError::Unreadable(e.to_string()))?;

    let (name, range) = workbook
        .worksheets()
        .into_iter()
        .find(|(_, range)| !range.is_empty())
        .ok_or(SheetError::NoWorksheetFound)?;

    let sheet = sheet_from_range(name, &range);
    debug!(
        "Read worksheet '{}': {} headers, {} data rows",
        sheet.name,
        sheet.columns.len(),
        sheet.rows.len()
    );
    Ok(sheet)
}

fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    // Pad on the left so cell positions are absolute column indices
    let grid = range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(Cell::from));
            cells
        })
        .collect();

    Sheet::from_grid(name, row_offset + 1, grid)
}
