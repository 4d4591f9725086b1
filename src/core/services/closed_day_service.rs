use crate::core::services::{ServiceError, ServiceResult};
use crate::ledger::{dates::parse_iso_date, to_iso_date, LedgerDocument};

/// What a closed-day change did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedDayOutcome {
    Marked,
    AlreadyMarked,
    Removed,
    NotMarked,
}

pub struct ClosedDayService;

impl ClosedDayService {
    pub fn mark_closed(document: &mut LedgerDocument, day: &str) -> ServiceResult<ClosedDayOutcome> {
        let day = normalize_day(day)?;
        if document.closed_days.insert(&day) {
            Ok(ClosedDayOutcome::Marked)
        } else {
            Ok(ClosedDayOutcome::AlreadyMarked)
        }
    }

    pub fn reopen(document: &mut LedgerDocument, day: &str) -> ServiceResult<ClosedDayOutcome> {
        let day = normalize_day(day)?;
        if document.closed_days.remove(&day) {
            Ok(ClosedDayOutcome::Removed)
        } else {
            Ok(ClosedDayOutcome::NotMarked)
        }
    }
}

fn normalize_day(day: &str) -> ServiceResult<String> {
    let trimmed = day.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation("Select a date to close.".into()));
    }
    parse_iso_date(trimmed)
        .map(to_iso_date)
        .ok_or_else(|| ServiceError::Validation("Date must use the YYYY-MM-DD format.".into()))
}
