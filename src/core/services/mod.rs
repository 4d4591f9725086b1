pub mod access_service;
pub mod closed_day_service;
pub mod entry_service;
pub mod summary_service;

pub use access_service::AccessService;
pub use closed_day_service::{ClosedDayOutcome, ClosedDayService};
pub use entry_service::EntryService;
pub use summary_service::{
    BucketSummary, DateRange, GroupMode, PeriodSummaries, RangeReport, Summary, SummaryService,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures reported by ledger operations; none of them leave the document changed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Entry not found: {0}")]
    NotFound(String),
    #[error("Enter the PIN to modify records.")]
    AuthenticationRequired,
    #[error("Incorrect PIN.")]
    IncorrectPin,
    #[error("New PIN and confirmation do not match.")]
    PinMismatch,
}
