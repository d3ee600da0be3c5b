//! Export serializers.
//!
//! JSON keeps full records. CSV and spreadsheet exports share a tabular
//! shape (ID, Titre, Date, Contenu) with content truncated for readability.

use crate::models::ListedAnalysis;
use crate::store::StoreError;
use rust_xlsxwriter::Workbook;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Maximum content length (in characters) in tabular exports.
pub const MAX_TABULAR_CONTENT: usize = 500;

/// Marker appended to truncated content.
pub const ELLIPSIS: &str = "...";

const TABULAR_HEADERS: [&str; 4] = ["ID", "Titre", "Date", "Contenu"];

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Spreadsheet,
}

impl FromStr for ExportFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" | "spreadsheet" => Ok(ExportFormat::Spreadsheet),
            other => Err(StoreError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Spreadsheet => write!(f, "excel"),
        }
    }
}

/// Result of an export: inline text, or the path of a written file.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutput {
    Text(String),
    File(PathBuf),
}

/// Full-fidelity JSON export.
pub fn to_json(analyses: &[ListedAnalysis]) -> Result<String, StoreError> {
    serde_json::to_string_pretty(analyses).map_err(|e| StoreError::Serialize {
        path: PathBuf::from("<export>"),
        source: e,
    })
}

/// Tabular CSV export.
pub fn to_csv(analyses: &[ListedAnalysis]) -> String {
    let mut output = String::new();

    output.push_str(&TABULAR_HEADERS.join(","));
    output.push('\n');

    for row in analyses.iter().map(tabular_row) {
        let cells: Vec<String> = row.iter().map(|cell| csv_escape(cell)).collect();
        output.push_str(&cells.join(","));
        output.push('\n');
    }

    output
}

/// Tabular spreadsheet export written to `path`.
pub fn to_spreadsheet(analyses: &[ListedAnalysis], path: &Path) -> Result<PathBuf, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in TABULAR_HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| StoreError::Spreadsheet(e.to_string()))?;
    }

    for (i, row) in analyses.iter().map(tabular_row).enumerate() {
        for (col, cell) in row.iter().enumerate() {
            worksheet
                .write_string((i + 1) as u32, col as u16, cell.as_str())
                .map_err(|e| StoreError::Spreadsheet(e.to_string()))?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| StoreError::Spreadsheet(e.to_string()))?;

    info!("Wrote spreadsheet export to {}", path.display());
    Ok(path.to_path_buf())
}

fn tabular_row(analysis: &ListedAnalysis) -> [String; 4] {
    [
        analysis.record.id.clone(),
        analysis.title.clone(),
        analysis.record.created_at.to_rfc3339(),
        truncate_content(&analysis.record.content, MAX_TABULAR_CONTENT),
    ]
}

/// Truncate to `max_chars` characters, appending [`ELLIPSIS`] when cut.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &content[..byte_idx], ELLIPSIS),
        None => content.to_string(),
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
