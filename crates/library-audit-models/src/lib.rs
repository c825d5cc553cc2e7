pub mod entry;
pub mod media;
pub mod report;
pub mod status;

pub use entry::{CatalogItem, LibraryEntry};
pub use media::{MediaKind, Service};
pub use report::{EntrySnapshot, Report, ReportBucket, ReportItem, ReportSummary, SuppressedMatch};
pub use status::CanonicalStatus;
