mod options;

pub use options::{OfficeOrder, SummaryOptions};
