// 📥 Import - turn an uploaded CSV or Excel file into an active display set
//
// Columns are matched by header name (any order, extras ignored).
// Rows with an empty required cell are dropped; any present-but-invalid
// value rejects the whole file. Both formats go through `collect_rows`.

use crate::error::{ExpenseError, Result};
use crate::expense::ExpenseDetails;
use calamine::{open_workbook, Data, DataType, Range, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const REQUIRED_COLUMNS: [&str; 4] = ["Category", "Amount", "Date", "Description"];

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub rows: Vec<ExpenseDetails>,
    /// Rows skipped because a required cell was empty
    pub dropped: usize,
}

/// Import `path`, picking the reader from the file extension
/// (`.xlsx` is read as a workbook, anything else as CSV)
pub fn import_file(path: &Path) -> Result<ImportReport> {
    let is_workbook = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    if is_workbook {
        import_xlsx(path)
    } else {
        import_csv(path)
    }
}

pub fn import_csv(path: &Path) -> Result<ImportReport> {
    let file = File::open(path).map_err(|e| {
        ExpenseError::import_rejected(format!("cannot read {}: {}", path.display(), e))
    })?;

    finish(path, parse_csv(file))
}

pub fn import_xlsx(path: &Path) -> Result<ImportReport> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        ExpenseError::import_rejected(format!("cannot read {}: {}", path.display(), e))
    })?;

    // Only the first worksheet is read
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExpenseError::import_rejected("workbook has no worksheets"))?
        .map_err(|e| ExpenseError::import_rejected(format!("unreadable worksheet: {}", e)))?;

    finish(path, parse_sheet(&sheet))
}

fn finish(path: &Path, parsed: Result<ImportReport>) -> Result<ImportReport> {
    let report = parsed.map_err(|e| {
        warn!(file = %path.display(), error = %e, "import rejected");
        e
    })?;
    debug!(
        file = %path.display(),
        rows = report.rows.len(),
        dropped = report.dropped,
        "import parsed"
    );
    Ok(report)
}

// ============================================================================
// FORMAT READERS
// ============================================================================

pub fn parse_csv<R: Read>(reader: R) -> Result<ImportReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ExpenseError::import_rejected(format!("unreadable header row: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let records = reader.records().enumerate().map(|(line_num, result)| {
        // +2: 1-indexed plus the header row
        let line = line_num + 2;
        result
            .map(|record| (line, record.iter().map(str::to_string).collect()))
            .map_err(|e| {
                ExpenseError::import_rejected(format!("line {} could not be parsed: {}", line, e))
            })
    });

    collect_rows(&headers, records)
}

/// Read a worksheet whose first used row is the header
pub fn parse_sheet(sheet: &Range<Data>) -> Result<ImportReport> {
    let first_row = sheet.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = sheet.rows();

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| ExpenseError::import_rejected("worksheet is empty"))?
        .iter()
        .map(cell_text)
        .collect();

    let records = rows.enumerate().map(|(idx, cells)| {
        // Spreadsheet row numbers: 1-indexed, header at `first_row + 1`
        let line = first_row + idx + 2;
        Ok::<_, ExpenseError>((line, cells.iter().map(cell_text).collect()))
    });

    collect_rows(&headers, records)
}

/// Cell as the text a CSV export of it would contain
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

// ============================================================================
// ROW CLEANING
// ============================================================================

fn collect_rows<I>(headers: &[String], records: I) -> Result<ImportReport>
where
    I: Iterator<Item = Result<(usize, Vec<String>)>>,
{
    // Position of each required column in this file
    let mut positions = [0usize; REQUIRED_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h.trim() == column) {
            Some(idx) => *slot = idx,
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Err(ExpenseError::import_rejected(format!(
            "missing column(s): {}",
            missing.join(", ")
        )));
    }
    let [category_at, amount_at, date_at, description_at] = positions;

    let mut rows = Vec::new();
    let mut dropped = 0;

    for record in records {
        let (line, fields) = record?;

        let cell = |idx: usize| fields.get(idx).map(|s| s.trim()).unwrap_or("");
        let (category, amount, date, description) = (
            cell(category_at),
            cell(amount_at),
            cell(date_at),
            cell(description_at),
        );

        if [category, amount, date, description].iter().any(|c| c.is_empty()) {
            dropped += 1;
            continue;
        }

        let details = ExpenseDetails::parse(category, amount, date, description).map_err(|e| {
            ExpenseError::import_rejected(format!("line {}: {}", line, e))
        })?;
        rows.push(details);
    }

    Ok(ImportReport { rows, dropped })
}
