#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::Path;

pub const HEADER: [&str; 6] = [
    "No",
    "Nomor ID Jaminan",
    "Kantor",
    "Status Pembayaran",
    "Status Verifikasi",
    "GL Status",
];

/// Write a workbook with one sheet. Empty strings leave the cell blank.
pub fn write_workbook(path: &Path, sheet_name: &str, rows: &[Vec<&str>]) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, *value)?;
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// A DATA CONTROL sheet with a title block above the header row.
pub fn claims_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["Laporan Klaim Penjaminan"],
        vec!["Periode: Oktober"],
        vec![],
        HEADER.to_vec(),
        vec!["1", "J-001", "Loket B", "Unpaid", "Done", "Active"],
        vec!["2", "J-002", "Loket A", "unpaid", "New", "active"],
        vec!["3", "J-003", "Loket B", "UNPAID", "Revision", "inactive"],
        vec!["4", "J-004", "Loket A", "paid", "Done", "active"],
        vec!["5", "J-005", "Loket A", "unpaid", "Waiting First Layer Verification", "active"],
        vec!["6", "J-006", "Loket B", "unpaid", "", "active"],
        vec!["7", "J-007", "Loket C", "unpaid", "Draft", "active"],
        vec!["8", "J-008", "Loket C", "unpaid", "resend to branch", "inactive"],
    ]
}

/// Full workbook fixture at `path`.
pub fn write_claims_workbook(path: &Path) -> anyhow::Result<()> {
    write_workbook(path, "DATA CONTROL", &claims_rows())
}
