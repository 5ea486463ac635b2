use crate::error::RustyLedgerError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::table::header::HeaderMap;
use crate::table::TableError;
use glob::Pattern;
use tracing::debug;

/// Header labels of a row as the host renders them.
pub(crate) fn row_labels(sheet: &Sheet, row: usize) -> Vec<String> {
    sheet.row(row).iter().map(|cell| cell.to_string()).collect()
}

/// Whether a row names both a status column and a due-date or task column.
fn is_header_row(labels: &[String]) -> bool {
    let headers = HeaderMap::new(labels);
    headers.find(Field::Status.candidates()).is_some()
        && (headers.find(Field::DueDate.candidates()).is_some()
            || headers.find(Field::Task.candidates()).is_some())
}

/// Finds the 1-based position of the header row within the first `scan_rows` rows.
pub fn locate_header_row(sheet: &Sheet, scan_rows: usize) -> Result<usize, TableError> {
    let window = scan_rows.min(sheet.last_row());
    (1..=window)
        .find(|row| is_header_row(&row_labels(sheet, *row)))
        .inspect(|row| debug!(sheet = %sheet.name, row, "Located header row"))
        .ok_or_else(|| TableError::HeaderNotFound {
            sheet: sheet.name.to_owned(),
            rows: scan_rows,
        })
}

/// Picks the sheet holding the task table, never `exclude`: the first sheet whose
/// name matches `pattern`, else the first sheet whose first row names both a
/// status and a due-date column.
pub fn find_data_sheet(workbook: &Workbook, pattern: &str, exclude: &str) -> Result<String, RustyLedgerError> {
    let pattern = Pattern::new(pattern)?;
    let candidates = || workbook.sheets().iter().filter(|sheet| sheet.name != exclude);
    if let Some(sheet) = candidates().find(|sheet| pattern.matches(&sheet.name)) {
        return Ok(sheet.name.to_owned());
    }

    candidates()
        .filter(|sheet| sheet.last_column() >= 2)
        .find(|sheet| {
            let headers = HeaderMap::new(&row_labels(sheet, 1));
            headers.find(Field::Status.candidates()).is_some() && headers.find(Field::DueDate.candidates()).is_some()
        })
        .map(|sheet| {
            debug!(sheet = %sheet.name, %pattern, "Detected data sheet by its headers");
            sheet.name.to_owned()
        })
        .ok_or_else(|| TableError::NoDataSheet(pattern.to_string()).into())
}
