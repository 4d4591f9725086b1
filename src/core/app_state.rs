//! Explicit application state: the loaded document, the PIN session, and the
//! report selection. Every mutation goes through a method here so the access
//! rules are applied in one place.

use chrono::NaiveDate;

use crate::core::services::{
    AccessService, ClosedDayOutcome, ClosedDayService, DateRange, EntryService, GroupMode,
    PeriodSummaries, RangeReport, ServiceResult, SummaryService,
};
use crate::core::session::Session;
use crate::core::time::Clock;
use crate::ledger::{EntryInput, LedgerDocument, LedgerEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub document: LedgerDocument,
    pub session: Session,
    pub range: DateRange,
    pub mode: GroupMode,
}

impl AppState {
    /// Starts a locked session showing the current month in monthly buckets.
    pub fn new(document: LedgerDocument, today: NaiveDate) -> Self {
        Self {
            document,
            session: Session::default(),
            range: DateRange::month_to_date(today),
            mode: GroupMode::default(),
        }
    }

    /// Seeds the default PIN digest when none is stored. A `true` result
    /// means the document changed and should be saved.
    pub fn ensure_pin_hash(&mut self, default_pin: &str) -> bool {
        AccessService::ensure_pin_hash(&mut self.document.settings, default_pin)
    }

    pub fn unlock(&mut self, pin: &str) -> ServiceResult<()> {
        self.session.unlock(&self.document.settings, pin)
    }

    pub fn lock(&mut self) {
        self.session.lock();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn set_mode(&mut self, mode: GroupMode) {
        self.mode = mode;
    }

    /// New entries never require the PIN.
    pub fn add_entry(&mut self, input: EntryInput, clock: &dyn Clock) -> ServiceResult<String> {
        let id = EntryService::add(&mut self.document, input, clock.now())?;
        tracing::debug!(%id, "Entry added.");
        Ok(id)
    }

    pub fn edit_entry(
        &mut self,
        id: &str,
        input: EntryInput,
        clock: &dyn Clock,
    ) -> ServiceResult<()> {
        self.session.require_authenticated()?;
        EntryService::edit(&mut self.document, id, input, clock.now())?;
        tracing::debug!(%id, "Entry updated.");
        Ok(())
    }

    pub fn delete_entry(&mut self, id: &str) -> ServiceResult<Option<LedgerEntry>> {
        self.session.require_authenticated()?;
        Ok(EntryService::delete(&mut self.document, id))
    }

    pub fn mark_closed_day(&mut self, day: &str) -> ServiceResult<ClosedDayOutcome> {
        self.session.require_authenticated()?;
        ClosedDayService::mark_closed(&mut self.document, day)
    }

    pub fn reopen_day(&mut self, day: &str) -> ServiceResult<ClosedDayOutcome> {
        self.session.require_authenticated()?;
        ClosedDayService::reopen(&mut self.document, day)
    }

    /// Proving the current PIN here also opens the session.
    pub fn change_pin(&mut self, current: &str, new_pin: &str, confirm: &str) -> ServiceResult<()> {
        AccessService::change_pin(&mut self.document.settings, current, new_pin, confirm)?;
        self.session.grant();
        tracing::info!("PIN updated.");
        Ok(())
    }

    pub fn report(&self) -> RangeReport {
        SummaryService::range_report(&self.document.entries, &self.range, self.mode)
    }

    pub fn period_summaries(&self, today: NaiveDate) -> PeriodSummaries {
        SummaryService::period_summaries(&self.document.entries, today)
    }

    pub fn missing_days(&self, today: NaiveDate, lookback_days: u32) -> Vec<String> {
        SummaryService::find_missing_days(
            &self.document.entries,
            &self.document.closed_days,
            today,
            lookback_days,
        )
    }

    pub fn recent_entries(&self, limit: usize) -> Vec<&LedgerEntry> {
        SummaryService::recent_entries(&self.document.entries, limit)
    }
}
