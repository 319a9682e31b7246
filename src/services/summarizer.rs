//! Per-office claim counts from the rows of a DATA CONTROL sheet.

use crate::error::{Result, SummaryError};
use crate::models::{OfficeOrder, SummaryOptions};
use crate::types::{Category, RawSheet, SheetRow, SummaryRow, SummaryTable};
use std::collections::HashMap;
use tracing::debug;

/// Any cell containing this text (case-insensitive) marks the header row.
pub const HEADER_MARKER: &str = "nomor id jaminan";

pub const COL_OFFICE: &str = "kantor";
pub const COL_PAYMENT_STATUS: &str = "status pembayaran";
pub const COL_VERIFICATION_STATUS: &str = "status verifikasi";
pub const COL_LEDGER_STATUS: &str = "gl status";

const UNPAID: &str = "unpaid";
const ACTIVE: &str = "active";

/// Index (0-based) of the first row with a cell containing the header marker.
pub fn find_header_row(sheet: &RawSheet) -> Result<usize> {
    sheet
        .rows
        .iter()
        .position(|row| {
            row.iter()
                .flatten()
                .any(|cell| cell.to_lowercase().contains(HEADER_MARKER))
        })
        .ok_or_else(|| SummaryError::HeaderNotFound(HEADER_MARKER.to_string()))
}

/// Lowercased header name → column index, built once per sheet.
#[derive(Debug, Default)]
pub struct ColumnIndex {
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn from_header(header: &[Option<String>]) -> Self {
        let mut by_name = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(text) = cell {
                // First occurrence wins for repeated names.
                by_name.entry(normalize(text)).or_insert(idx);
            }
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(&normalize(name)).copied()
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.get(name)
            .ok_or_else(|| SummaryError::MissingColumn(name.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    office: usize,
    payment: usize,
    verification: usize,
    ledger: Option<usize>,
}

impl Columns {
    fn resolve(index: &ColumnIndex, options: &SummaryOptions) -> Result<Self> {
        let office = index.require(COL_OFFICE)?;
        let payment = index.require(COL_PAYMENT_STATUS)?;
        let verification = index.require(COL_VERIFICATION_STATUS)?;
        let ledger = if options.require_active_ledger {
            Some(index.require(COL_LEDGER_STATUS)?)
        } else {
            None
        };
        Ok(Self {
            office,
            payment,
            verification,
            ledger,
        })
    }
}

fn cell(row: &SheetRow, idx: usize) -> Option<&str> {
    row.get(idx).and_then(|c| c.as_deref())
}

fn lowercase_equals(value: Option<&str>, expected: &str) -> bool {
    value.map(|v| v.to_lowercase() == expected).unwrap_or(false)
}

fn passes_filter(row: &SheetRow, cols: &Columns) -> bool {
    if !lowercase_equals(cell(row, cols.payment), UNPAID) {
        return false;
    }
    match cols.ledger {
        Some(ledger) => lowercase_equals(cell(row, ledger), ACTIVE),
        None => true,
    }
}

/// Bucket for a verification status. Missing values land in Other.
pub fn classify(status: Option<&str>) -> Category {
    let status = match status {
        Some(s) => s.to_lowercase(),
        None => return Category::Other,
    };
    if status.contains("done") || status.contains("resend") {
        Category::Done
    } else if status == "revision" {
        Category::Revision
    } else if status == "new" || status == "draft" {
        Category::New
    } else if status == "waiting first layer verification" {
        Category::WaitingFirstLayerVerification
    } else {
        Category::Other
    }
}

/// Locate the header, filter the rows below it and count them per office.
pub fn summarize(sheet: &RawSheet, options: &SummaryOptions) -> Result<SummaryTable> {
    let header_idx = find_header_row(sheet)?;
    let index = ColumnIndex::from_header(&sheet.rows[header_idx]);
    let cols = Columns::resolve(&index, options)?;
    debug!(
        sheet = %sheet.name,
        header_row = header_idx + 1,
        ?cols,
        "resolved summary columns"
    );

    let mut offices: Vec<SummaryRow> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut kept = 0usize;

    for row in sheet.rows.iter().skip(header_idx + 1) {
        if !passes_filter(row, &cols) {
            continue;
        }
        kept += 1;
        let office = cell(row, cols.office).unwrap_or_default();
        let slot = match position.get(office) {
            Some(&i) => i,
            None => {
                position.insert(office.to_string(), offices.len());
                offices.push(SummaryRow::new(office));
                offices.len() - 1
            }
        };
        offices[slot].record(classify(cell(row, cols.verification)));
    }

    if options.office_order == OfficeOrder::Sorted {
        offices.sort_by(|a, b| a.office.cmp(&b.office));
    }

    debug!(kept, offices = offices.len(), "summary built");
    Ok(SummaryTable::from_offices(offices))
}
