use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::core::JudgeError;

/// A single roster cell as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// True for empty cells, empty text, NaN and the literal text "nan".
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty() || s.eq_ignore_ascii_case("nan"),
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            // roster numbers are usually entry numbers and ages
            CellValue::Float(v) if v.is_nan() => Ok(()),
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// One entrant: column name to raw cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterRow {
    cells: HashMap<String, CellValue>,
}

impl RosterRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    /// Cell for a mapped column; unmapped or unknown columns read as empty.
    pub fn cell(&self, column: Option<&str>) -> &CellValue {
        column
            .and_then(|c| self.cells.get(c))
            .unwrap_or(&EMPTY_CELL)
    }

    fn is_empty(&self) -> bool {
        self.cells.values().all(|v| matches!(v, CellValue::Empty))
    }
}

/// One named table of the roster, i.e. one judging category.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<RosterRow>,
}

impl RosterSheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<RosterRow>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// First row is the header; blank data rows are dropped.
    pub fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let columns = match rows.next() {
            Some(header) => header_names(header),
            None => Vec::new(),
        };

        let rows = rows
            .map(|cells| {
                let mut row = RosterRow::new();
                for (column, data) in columns.iter().zip(cells) {
                    row.insert(column.clone(), CellValue::from(data));
                }
                row
            })
            .filter(|row| !row.is_empty())
            .collect();

        Self::new(name, columns, rows)
    }
}

fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let base = match CellValue::from(cell) {
                CellValue::Empty => format!("Unnamed: {}", index),
                value => value.to_string().trim().to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Sheets whose name contains none of the bookkeeping keywords.
pub fn default_sheets(names: &[String], ignore_keywords: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| !ignore_keywords.iter().any(|kw| name.contains(kw.as_str())))
        .cloned()
        .collect()
}

pub struct RosterWorkbook {
    workbook: Sheets<BufReader<File>>,
}

impl RosterWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = open_workbook_auto(path)
            .with_context(|| format!("failed to open roster {}", path.display()))?;
        Ok(Self { workbook })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    pub fn read_sheet(&mut self, name: &str) -> Result<RosterSheet> {
        if !self.sheet_names().iter().any(|n| n == name) {
            return Err(JudgeError::UnknownSheet(name.to_string()).into());
        }
        let range = self
            .workbook
            .worksheet_range(name)
            .with_context(|| format!("failed to read sheet '{}'", name))?;
        let sheet = RosterSheet::from_range(name, &range);
        debug!("Read sheet '{}': {} columns, {} rows", name, sheet.columns.len(), sheet.rows.len());
        Ok(sheet)
    }

    /// Reads the given sheets in order.
    pub fn read_sheets(&mut self, names: &[String]) -> Result<Vec<RosterSheet>> {
        names.iter().map(|name| self.read_sheet(name)).collect()
    }
}
