use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SummaryError};
use crate::types::{RawSheet, SheetRow, SummaryRow, SummaryTable, SUMMARY_COLUMNS};

/// Sheet the claim data is read from.
pub const SOURCE_SHEET: &str = "DATA CONTROL";
/// Sheet name of the exported summary workbook.
pub const SUMMARY_SHEET: &str = "Summary";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Check size and magic bytes before handing the file to calamine.
/// Accepts zip containers (xlsx, xlsm, ods) and OLE2 (xls).
pub fn validate_excel_file(path: &Path, max_bytes: u64) -> Result<()> {
    if !path.exists() {
        return Err(SummaryError::InvalidFile("File not found.".to_string()));
    }
    let metadata = fs::metadata(path)?;
    if metadata.len() > max_bytes {
        return Err(SummaryError::InvalidFile(format!(
            "File too large (max {}MB).",
            max_bytes / (1024 * 1024)
        )));
    }
    let mut f = fs::File::open(path)?;
    let mut header = [0u8; 8];
    let n = f.read(&mut header)?;
    if n >= 4 && header[..4] == ZIP_MAGIC {
        return Ok(());
    }
    if n == 8 && header == OLE_MAGIC {
        return Ok(());
    }
    Err(SummaryError::InvalidFile(
        "Not a valid Excel file (.xlsx or .xls).".to_string(),
    ))
}

/// Text of one cell. Empty and error cells are `None`.
/// Date cells give their Excel serial number, ISO cells their string.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(v) => Some(v.clone()),
        Data::Float(v) => Some(v.to_string()),
        Data::Int(v) => Some(v.to_string()),
        Data::Bool(v) => Some(v.to_string()),
        Data::DateTime(v) => Some(v.as_f64().to_string()),
        Data::DateTimeIso(v) => Some(v.clone()),
        Data::DurationIso(v) => Some(v.clone()),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Read every row of `sheet_name` as text.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<RawSheet> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SummaryError::Open(e.to_string()))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(SummaryError::SheetNotFound(sheet_name.to_string()));
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| SummaryError::Open(format!("sheet '{}': {}", sheet_name, e)))?;
    let rows: Vec<SheetRow> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    debug!(sheet = sheet_name, rows = rows.len(), "sheet loaded");
    Ok(RawSheet::new(sheet_name, rows))
}

/// Drop control characters that make Excel report unreadable content.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || c == '\r' || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

/// Estimate column width from text length (char count × 1.2, clamped 10–50).
fn estimate_text_width(text: &str) -> f64 {
    let w = text.chars().count() as f64 * 1.2;
    w.clamp(10.0, 50.0)
}

fn calculate_column_widths(table: &SummaryTable) -> Vec<f64> {
    let mut widths: Vec<f64> = SUMMARY_COLUMNS
        .iter()
        .map(|h| estimate_text_width(h))
        .collect();
    for row in table.rows() {
        widths[0] = widths[0].max(estimate_text_width(&row.office));
    }
    widths
}

fn write_summary_row(
    worksheet: &mut Worksheet,
    row_idx: u32,
    row: &SummaryRow,
    text_format: &Format,
    number_format: &Format,
) -> std::result::Result<(), XlsxError> {
    worksheet.write_string_with_format(row_idx, 0, sanitize_cell(&row.office), text_format)?;
    for (i, value) in row.counts().iter().enumerate() {
        worksheet.write_number_with_format(row_idx, (i + 1) as u16, *value as f64, number_format)?;
    }
    Ok(())
}

/// Write `table` to a new workbook at `path` with a single "Summary" sheet:
/// header row, one row per office, "Total" row last. No index column.
pub fn export_summary_to_excel(table: &SummaryTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SUMMARY_SHEET)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x2563EB))
        .set_font_color(Color::RGB(0xFFFFFF));
    let text_format = Format::new();
    let number_format = Format::new().set_num_format("0").set_align(FormatAlign::Right);
    let total_text_format = Format::new().set_bold();
    let total_number_format = number_format.clone().set_bold();

    for (col, &w) in calculate_column_widths(table).iter().enumerate() {
        worksheet.set_column_width(col as u16, w)?;
    }
    for (col, header) in SUMMARY_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    let mut row_idx = 1u32;
    for row in &table.offices {
        write_summary_row(worksheet, row_idx, row, &text_format, &number_format)?;
        row_idx += 1;
    }
    write_summary_row(
        worksheet,
        row_idx,
        &table.total,
        &total_text_format,
        &total_number_format,
    )?;

    worksheet.set_freeze_panes(1, 0)?;
    workbook.save(path)?;
    info!(path = %path.display(), offices = table.offices.len(), "summary workbook written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn cell_text_covers_scalar_variants() {
        assert_eq!(cell_text(&Data::String("Unpaid".into())), Some("Unpaid".into()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".into()));
        assert_eq!(cell_text(&Data::Float(1.5)), Some("1.5".into()));
        assert_eq!(cell_text(&Data::Bool(true)), Some("true".into()));
        assert_eq!(cell_text(&Data::Empty), None);
    }

    #[test]
    fn date_cells_read_as_serial_numbers() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dates.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SOURCE_SHEET)?;
        let date = Format::new().set_num_format("yyyy-mm-dd");
        worksheet.write_number_with_format(0, 0, 45292.0, &date)?;
        worksheet.write_number_with_format(0, 1, 45292.5, &date)?;
        workbook.save(&path)?;

        let sheet = read_sheet(&path, SOURCE_SHEET)?;
        assert_eq!(sheet.rows[0][0].as_deref(), Some("45292"));
        assert_eq!(sheet.rows[0][1].as_deref(), Some("45292.5"));
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-01-01T00:00:00".into())),
            Some("2024-01-01T00:00:00".into())
        );
        Ok(())
    }

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_cell("Loket\u{0001} 1\n"), "Loket 1\n");
    }

    #[test]
    fn rejects_non_excel_bytes() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"kantor,status\n")?;
        let err = validate_excel_file(tmp.path(), 1024).unwrap_err();
        assert!(matches!(err, SummaryError::InvalidFile(_)));
        Ok(())
    }

    #[test]
    fn rejects_oversized_file() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&ZIP_MAGIC)?;
        tmp.write_all(&[0u8; 64])?;
        let err = validate_excel_file(tmp.path(), 16).unwrap_err();
        assert!(err.to_string().contains("too large"));
        Ok(())
    }

    #[test]
    fn accepts_zip_and_ole_headers() -> anyhow::Result<()> {
        let mut zip = NamedTempFile::new()?;
        zip.write_all(&ZIP_MAGIC)?;
        validate_excel_file(zip.path(), 1024)?;

        let mut ole = NamedTempFile::new()?;
        ole.write_all(&OLE_MAGIC)?;
        validate_excel_file(ole.path(), 1024)?;
        Ok(())
    }

    #[test]
    fn export_reads_back_with_calamine() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("summary.xlsx");
        let mut a = SummaryRow::new("Loket A");
        a.done = 2;
        a.other = 1;
        a.total = 3;
        let table = SummaryTable::from_offices(vec![a]);

        export_summary_to_excel(&table, &path)?;
        validate_excel_file(&path, 10 * 1024 * 1024)?;

        let sheet = read_sheet(&path, SUMMARY_SHEET)?;
        assert_eq!(sheet.rows.len(), 3);
        let header: Vec<String> = sheet.rows[0].iter().flatten().cloned().collect();
        assert_eq!(header, SUMMARY_COLUMNS.to_vec());
        assert_eq!(sheet.rows[1][0].as_deref(), Some("Loket A"));
        assert_eq!(sheet.rows[1][1].as_deref(), Some("2"));
        assert_eq!(sheet.rows[2][0].as_deref(), Some("Total"));
        assert_eq!(sheet.rows[2][6].as_deref(), Some("3"));
        Ok(())
    }

    #[test]
    fn missing_sheet_is_reported_by_name() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("summary.xlsx");
        export_summary_to_excel(&SummaryTable::from_offices(Vec::new()), &path)?;
        match read_sheet(&path, SOURCE_SHEET) {
            Err(SummaryError::SheetNotFound(name)) => assert_eq!(name, SOURCE_SHEET),
            other => panic!("expected SheetNotFound, got {:?}", other),
        }
        Ok(())
    }
}
