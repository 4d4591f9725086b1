//! Ledger domain models, persistence-friendly types, and calendar helpers.

pub mod dates;
pub mod document;
pub mod entry;
pub mod settings;

pub use dates::{
    format_amount, format_short_date, parse_iso_date, to_iso_date, week_end, week_start,
};
pub use document::{ClosedDaySet, LedgerDocument, ParsedDocument};
pub use entry::{EntryInput, EntryKind, LedgerEntry};
pub use settings::Settings;
