use serde::{Deserialize, Serialize};

/// Order of office rows in the summary. The "Total" row is always last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfficeOrder {
    /// Order in which offices first appear in the sheet.
    #[default]
    FirstSeen,
    /// Lexicographic by office label.
    Sorted,
}

/// Knobs that distinguish the on-screen summary from the downloadable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    /// Also require the "gl status" column and keep only "active" rows.
    pub require_active_ledger: bool,
    pub office_order: OfficeOrder,
}

impl SummaryOptions {
    /// Unpaid rows only, offices in sheet order. Used for the HTML page.
    pub fn html_preset() -> Self {
        Self {
            require_active_ledger: false,
            office_order: OfficeOrder::FirstSeen,
        }
    }

    /// Unpaid and active rows, offices sorted. Used for the xlsx download.
    pub fn download_preset() -> Self {
        Self {
            require_active_ledger: true,
            office_order: OfficeOrder::Sorted,
        }
    }

    pub fn with_active_ledger(mut self, on: bool) -> Self {
        self.require_active_ledger = on;
        self
    }

    pub fn with_order(mut self, order: OfficeOrder) -> Self {
        self.office_order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_in_filter_and_order() {
        let html = SummaryOptions::html_preset();
        let download = SummaryOptions::download_preset();
        assert!(!html.require_active_ledger);
        assert_eq!(html.office_order, OfficeOrder::FirstSeen);
        assert!(download.require_active_ledger);
        assert_eq!(download.office_order, OfficeOrder::Sorted);
        assert_eq!(html, SummaryOptions::default());
    }

    #[test]
    fn builders_override_preset() {
        let opts = SummaryOptions::download_preset()
            .with_active_ledger(false)
            .with_order(OfficeOrder::FirstSeen);
        assert_eq!(opts, SummaryOptions::html_preset());
    }
}
