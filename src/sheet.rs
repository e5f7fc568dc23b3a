//! Append-only tabular sinks.
use std::path::{Path, PathBuf};

use crate::error::{ModelXrefError, Result};

pub const OVERVIEW_HEADERS: [&str; 10] = [
    "Location Type",
    "Excluded",
    "Location Name",
    "Layout",
    "Element Type",
    "Element Name",
    "Class",
    "Style",
    "Snippet Reference",
    "Widget ID",
];

pub const FLOW_HEADERS: [&str; 7] = [
    "Excluded",
    "Name",
    "Actions",
    "Loops",
    "Open page",
    "Call flow",
    "External action",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(title: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn overview() -> Self {
        Self::new("overview", &OVERVIEW_HEADERS)
    }

    pub fn flows() -> Self {
        Self::new("flows", &FLOW_HEADERS)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Appends a row, padded with empty cells (or cut) to the sheet width.
    pub fn add_line(&mut self, mut row: Vec<String>) {
        row.resize(self.width(), String::new());
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = Vec<String>>) {
        for row in rows {
            self.add_line(row);
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let to_error = |e: csv::Error| ModelXrefError::Write { path: path.to_path_buf(), message: e.to_string() };
        let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
        writer.write_record(&self.headers).map_err(to_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(to_error)?;
        }
        writer.flush().map_err(|e| ModelXrefError::Write { path: path.to_path_buf(), message: e.to_string() })
    }
}

/// Writes each sheet to `<dir>/<title>.csv`, creating `dir` when needed.
pub fn write_sheets(dir: &Path, sheets: &[&Sheet]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ModelXrefError::Write { path: dir.to_path_buf(), message: e.to_string() })?;
    let mut written = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let path = dir.join(format!("{}.csv", sheet.title()));
        sheet.write_csv(&path)?;
        written.push(path);
    }
    Ok(written)
}
