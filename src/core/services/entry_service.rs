//! Business logic helpers for managing ledger entries.

use chrono::{DateTime, Utc};

use crate::core::services::{ServiceError, ServiceResult};
use crate::ledger::{dates::parse_iso_date, EntryInput, EntryKind, LedgerDocument, LedgerEntry};

/// Provides validated add/edit/delete helpers for ledger entries.
pub struct EntryService;

impl EntryService {
    /// Checks the required fields and returns the entry kind.
    pub fn validate(input: &EntryInput) -> ServiceResult<EntryKind> {
        let date = input.date.trim();
        if date.is_empty() {
            return Err(ServiceError::Validation("Date is required.".into()));
        }
        if parse_iso_date(date).is_none() {
            return Err(ServiceError::Validation(
                "Date must use the YYYY-MM-DD format.".into(),
            ));
        }
        let kind = input
            .kind
            .ok_or_else(|| ServiceError::Validation("Type is required.".into()))?;
        if !input.amount.is_finite() || input.amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Amount must be a positive number.".into(),
            ));
        }
        Ok(kind)
    }

    /// Appends a new entry and returns its identifier.
    pub fn add(
        document: &mut LedgerDocument,
        input: EntryInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<String> {
        let kind = Self::validate(&input)?;
        let date = input.date.trim().to_string();
        let id = document.unique_entry_id(&date, now);
        let entry = LedgerEntry {
            id,
            date,
            kind,
            amount: input.amount,
            category: input.category.trim().to_string(),
            payment_mode: clean_optional(input.payment_mode),
            note: input.note.trim().to_string(),
            created_at: Some(now),
            updated_at: None,
        };
        Ok(document.push_entry(entry))
    }

    /// Overwrites every mutable field of the entry identified by `id`.
    /// The identifier and creation timestamp are preserved.
    pub fn edit(
        document: &mut LedgerDocument,
        id: &str,
        input: EntryInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if document.entry(id).is_none() {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        let kind = Self::validate(&input)?;
        let entry = document
            .entry_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        entry.date = input.date.trim().to_string();
        entry.kind = kind;
        entry.amount = input.amount;
        entry.category = input.category.trim().to_string();
        entry.payment_mode = clean_optional(input.payment_mode);
        entry.note = input.note.trim().to_string();
        entry.updated_at = Some(now);
        Ok(())
    }

    /// Removes the entry identified by `id`. Unknown identifiers are a no-op.
    pub fn delete(document: &mut LedgerDocument, id: &str) -> Option<LedgerEntry> {
        document.remove_entry(id)
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap()
    }

    fn sale(amount: f64) -> EntryInput {
        EntryInput::new("2024-01-05", EntryKind::Income, amount).with_category("Printing")
    }

    #[test]
    fn add_assigns_date_based_id_and_creation_time() {
        let mut doc = LedgerDocument::default();
        let id = EntryService::add(&mut doc, sale(100.0), now()).unwrap();
        assert_eq!(id, format!("2024-01-05_{}", now().timestamp_millis()));
        let entry = doc.entry(&id).unwrap();
        assert_eq!(entry.created_at, Some(now()));
        assert_eq!(entry.category, "Printing");
    }

    #[test]
    fn add_rejects_invalid_input_without_mutating() {
        let mut doc = LedgerDocument::default();
        let cases = [
            EntryInput::new("", EntryKind::Income, 1.0),
            EntryInput::new("05/01/2024", EntryKind::Income, 1.0),
            EntryInput {
                kind: None,
                ..sale(1.0)
            },
            sale(0.0),
            sale(-3.0),
            sale(f64::NAN),
            sale(f64::INFINITY),
        ];
        for input in cases {
            let err = EntryService::add(&mut doc, input.clone(), now())
                .expect_err("invalid input must be rejected");
            assert!(matches!(err, ServiceError::Validation(_)), "unexpected error: {err:?}");
        }
        assert!(doc.entries.is_empty());
    }

    #[test]
    fn same_millisecond_adds_get_distinct_ids() {
        let mut doc = LedgerDocument::default();
        let first = EntryService::add(&mut doc, sale(1.0), now()).unwrap();
        let second = EntryService::add(&mut doc, sale(2.0), now()).unwrap();
        assert_ne!(first, second);
        assert_eq!(doc.entry_count(), 2);
    }

    #[test]
    fn edit_overwrites_fields_and_preserves_identity() {
        let mut doc = LedgerDocument::default();
        let id = EntryService::add(&mut doc, sale(100.0), now()).unwrap();
        let later = now() + chrono::Duration::hours(2);
        let update = EntryInput::new("2024-01-06", EntryKind::Expense, 12.5)
            .with_note("toner")
            .with_payment_mode("upi");
        EntryService::edit(&mut doc, &id, update, later).unwrap();

        let entry = doc.entry(&id).unwrap();
        assert_eq!(entry.date, "2024-01-06");
        assert_eq!(entry.kind, EntryKind::Expense);
        assert_eq!(entry.amount, 12.5);
        assert_eq!(entry.category, "");
        assert_eq!(entry.payment_mode.as_deref(), Some("upi"));
        assert_eq!(entry.created_at, Some(now()));
        assert_eq!(entry.updated_at, Some(later));
    }

    #[test]
    fn edit_fails_for_missing_entry() {
        let mut doc = LedgerDocument::default();
        EntryService::add(&mut doc, sale(100.0), now()).unwrap();
        let before = doc.clone();
        let err = EntryService::edit(&mut doc, "missing", sale(5.0), now())
            .expect_err("edit must fail for unknown id");
        assert_eq!(err, ServiceError::NotFound("missing".into()));
        assert_eq!(doc, before);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut doc = LedgerDocument::default();
        let id = EntryService::add(&mut doc, sale(100.0), now()).unwrap();
        assert!(EntryService::delete(&mut doc, &id).is_some());
        assert!(EntryService::delete(&mut doc, &id).is_none());
        assert!(doc.entries.is_empty());
    }
}
