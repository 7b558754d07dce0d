use calamine::{open_workbook_auto, Data, Reader, Sheets};
use indexmap::IndexMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::{PortfolioError, Result};

/// A spreadsheet cell reduced to what the extractor cares about
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    /// Display form used for labels and headers; integral numbers lose their ".0"
    pub fn as_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            _ => Cell::Empty,
        }
    }
}

/// A sheet as rows of cells; row 0 holds the year headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<Cell>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.len() < 2
    }

    pub fn header(&self) -> &[Cell] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Data rows, header excluded
    pub fn body(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// First-column label of each data row
    pub fn labels(&self) -> Vec<String> {
        self.body()
            .iter()
            .map(|row| row.first().map(Cell::as_label).unwrap_or_default())
            .collect()
    }
}

/// Anything the extractor can read sheets from
pub trait WorkbookSource {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid>;
}

/// Workbook on disk (xlsx, xlsm, xls, ods)
pub struct CalamineWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path).map_err(|e| PortfolioError::Workbook {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names().to_vec()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid> {
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| PortfolioError::Workbook {
                path: self.path.clone(),
                reason: format!("sheet '{}': {}", name, e),
            })?;

        Ok(SheetGrid::new(
            range
                .rows()
                .map(|row| row.iter().map(Cell::from).collect())
                .collect(),
        ))
    }
}

/// In-memory workbook, handy for feeding the extractor without a file
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: IndexMap<String, SheetGrid>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<Cell>>) -> Self {
        self.sheets.insert(name.to_string(), SheetGrid::new(rows));
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid> {
        self.sheets.get(name).cloned().ok_or_else(|| PortfolioError::Workbook {
            path: PathBuf::from("<memory>"),
            reason: format!("no sheet named '{}'", name),
        })
    }
}
