use serde::{Deserialize, Serialize};

/// Column headers of the summary table, in output order.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "Kantor",
    "Done",
    "Revision",
    "New",
    "Waiting First Layer Verification",
    "Other",
    "Total",
];

/// Office label of the synthetic grand-total row.
pub const TOTAL_LABEL: &str = "Total";

/// One row of a sheet as text. `None` marks empty or error cells.
pub type SheetRow = Vec<Option<String>>;

/// Rows of one worksheet in scan order. Never mutated after reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<SheetRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Verification bucket a claim row is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Done,
    Revision,
    New,
    WaitingFirstLayerVerification,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Done,
        Category::Revision,
        Category::New,
        Category::WaitingFirstLayerVerification,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Done => "Done",
            Category::Revision => "Revision",
            Category::New => "New",
            Category::WaitingFirstLayerVerification => "Waiting First Layer Verification",
            Category::Other => "Other",
        }
    }
}

/// Counters for one office (or the grand total).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub office: String,
    pub done: u64,
    pub revision: u64,
    pub new: u64,
    pub waiting_first_layer_verification: u64,
    pub other: u64,
    pub total: u64,
}

impl SummaryRow {
    pub fn new(office: impl Into<String>) -> Self {
        Self {
            office: office.into(),
            ..Default::default()
        }
    }

    /// Count one row under `category`; Total moves with it.
    pub fn record(&mut self, category: Category) {
        *self.counter_mut(category) += 1;
        self.total += 1;
    }

    pub fn count(&self, category: Category) -> u64 {
        match category {
            Category::Done => self.done,
            Category::Revision => self.revision,
            Category::New => self.new,
            Category::WaitingFirstLayerVerification => self.waiting_first_layer_verification,
            Category::Other => self.other,
        }
    }

    fn counter_mut(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Done => &mut self.done,
            Category::Revision => &mut self.revision,
            Category::New => &mut self.new,
            Category::WaitingFirstLayerVerification => &mut self.waiting_first_layer_verification,
            Category::Other => &mut self.other,
        }
    }

    /// The six numeric columns in output order (five categories, then Total).
    pub fn counts(&self) -> [u64; 6] {
        [
            self.done,
            self.revision,
            self.new,
            self.waiting_first_layer_verification,
            self.other,
            self.total,
        ]
    }

    fn add(&mut self, other: &SummaryRow) {
        for category in Category::ALL {
            *self.counter_mut(category) += other.count(category);
        }
        self.total += other.total;
    }
}

/// Per-office rows followed by the grand-total row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTable {
    pub offices: Vec<SummaryRow>,
    pub total: SummaryRow,
}

impl SummaryTable {
    /// Build the table and its "Total" row from already ordered office rows.
    pub fn from_offices(offices: Vec<SummaryRow>) -> Self {
        let mut total = SummaryRow::new(TOTAL_LABEL);
        for row in &offices {
            total.add(row);
        }
        Self { offices, total }
    }

    /// All rows as displayed: offices first, grand total last.
    pub fn rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.offices.iter().chain(std::iter::once(&self.total))
    }

    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }
}
