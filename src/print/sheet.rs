use spreadsheet_ods::{read_ods, write_ods, Value, WorkBook};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::CellRef;
use crate::error::{OrderError, Result};

/// Currency attached to money cells
pub const CURRENCY: &str = "EUR";

/// Write access to the first sheet of a template
pub trait CellSink {
    fn set_text(&mut self, cell: CellRef, value: &str);
    fn set_number(&mut self, cell: CellRef, value: f64);
    fn set_currency(&mut self, cell: CellRef, value: f64);
    /// Empty the cell, formula included
    fn clear(&mut self, cell: CellRef);
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Currency(f64),
    Formula(String),
}

/// Sheet kept in memory; what the projection wrote can be inspected cell by cell
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    cells: BTreeMap<CellRef, CellValue>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// Pre-fill a cell, e.g. with stale content from an earlier printout
    pub fn insert(&mut self, cell: CellRef, value: CellValue) {
        self.cells.insert(cell, value);
    }

    pub fn text(&self, cell: CellRef) -> Option<&str> {
        match self.cells.get(&cell) {
            Some(CellValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn amount(&self, cell: CellRef) -> Option<f64> {
        match self.cells.get(&cell) {
            Some(CellValue::Number(v)) | Some(CellValue::Currency(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn is_blank(&self, cell: CellRef) -> bool {
        !self.cells.contains_key(&cell)
    }
}

impl CellSink for MemorySheet {
    fn set_text(&mut self, cell: CellRef, value: &str) {
        if value.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, CellValue::Text(value.to_string()));
        }
    }

    fn set_number(&mut self, cell: CellRef, value: f64) {
        self.cells.insert(cell, CellValue::Number(value));
    }

    fn set_currency(&mut self, cell: CellRef, value: f64) {
        self.cells.insert(cell, CellValue::Currency(value));
    }

    fn clear(&mut self, cell: CellRef) {
        self.cells.remove(&cell);
    }
}

/// An OpenDocument spreadsheet opened from the template file. Cell styles from
/// the template are kept; only values and formulas are touched.
pub struct OdsSheet {
    book: WorkBook,
}

impl OdsSheet {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OrderError::TemplateNotFound(path.to_path_buf()));
        }
        let book = read_ods(path).map_err(|e| OrderError::Spreadsheet(e.to_string()))?;
        if book.num_sheets() == 0 {
            return Err(OrderError::Spreadsheet(format!(
                "template {} has no sheets",
                path.display()
            )));
        }
        Ok(Self { book })
    }

    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        write_ods(&mut self.book, path).map_err(|e| OrderError::Spreadsheet(e.to_string()))
    }

    fn put(&mut self, cell: CellRef, value: Value) {
        let sheet = self.book.sheet_mut(0);
        sheet.set_value(cell.row, cell.col, value);
        // Template formulas would otherwise recompute over the written value
        sheet.clear_formula(cell.row, cell.col);
    }
}

impl CellSink for OdsSheet {
    fn set_text(&mut self, cell: CellRef, value: &str) {
        let value = if value.is_empty() {
            Value::Empty
        } else {
            Value::from(value)
        };
        self.put(cell, value);
    }

    fn set_number(&mut self, cell: CellRef, value: f64) {
        self.put(cell, Value::Number(value));
    }

    fn set_currency(&mut self, cell: CellRef, value: f64) {
        self.put(cell, Value::Currency(value, CURRENCY.into()));
    }

    fn clear(&mut self, cell: CellRef) {
        self.put(cell, Value::Empty);
    }
}
