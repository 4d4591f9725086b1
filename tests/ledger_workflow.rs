mod common;

use std::sync::Arc;

use common::{adapter_in, entry, temp_base, today};
use shop_ledger::{
    core::{
        services::{ClosedDayOutcome, GroupMode, ServiceError, SummaryService},
        AppState, FixedClock,
    },
    ledger::{EntryInput, EntryKind, LedgerDocument},
    storage::InMemoryObjectStore,
};

#[test]
fn monthly_bucket_and_range_filter_scenarios() {
    let entries = vec![
        entry("a", "2024-01-05", EntryKind::Income, 100.0),
        entry("b", "2024-01-10", EntryKind::Expense, 40.0),
    ];

    let buckets = SummaryService::group_entries_by_mode(&entries, GroupMode::Monthly);
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].key, "2024-01");
    assert_eq!(buckets[0].income, 100.0);
    assert_eq!(buckets[0].expense, 40.0);
    assert_eq!(buckets[0].profit, 60.0);

    let filtered =
        SummaryService::filter_entries_by_date_range(&entries, Some("2024-01-06"), Some("2024-01-31"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "b");
}

#[test]
fn missing_days_with_no_data_are_the_last_n_days() {
    let doc = LedgerDocument::default();
    let missing =
        SummaryService::find_missing_days(&doc.entries, &doc.closed_days, today(), 3);
    assert_eq!(missing, vec!["2024-03-15", "2024-03-14", "2024-03-13"]);
}

#[test]
fn gated_workflow_persists_through_the_adapter() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());
    let adapter = adapter_in(&base, remote);
    adapter.initialize();
    let clock = FixedClock::on(today());

    let loaded = adapter.fetch_document();
    let mut state = AppState::new(loaded.document, today());
    assert!(state.ensure_pin_hash("2807"));

    let id = state
        .add_entry(
            EntryInput::new("2024-03-15", EntryKind::Income, 250.0).with_category("Printing"),
            &clock,
        )
        .unwrap();
    assert_eq!(
        state.mark_closed_day("2024-03-10"),
        Err(ServiceError::AuthenticationRequired)
    );

    state.unlock("2807").unwrap();
    assert_eq!(
        state.mark_closed_day("2024-03-10").unwrap(),
        ClosedDayOutcome::Marked
    );
    assert_eq!(
        state.mark_closed_day("2024-03-10").unwrap(),
        ClosedDayOutcome::AlreadyMarked
    );
    let before = state.document.clone();
    assert_eq!(
        state.edit_entry(
            "missing",
            EntryInput::new("2024-03-15", EntryKind::Income, 1.0),
            &clock
        ),
        Err(ServiceError::NotFound("missing".into()))
    );
    assert_eq!(state.document, before);

    // Not signed in: only the local copy is written.
    assert!(adapter.save_document(&state.document).is_err());

    let reloaded = adapter.fetch_document();
    assert_eq!(reloaded.document, state.document);
    assert_eq!(reloaded.document.entry(&id).unwrap().category, "Printing");
    assert_eq!(reloaded.document.closed_days.len(), 1);
}

#[test]
fn unknown_settings_and_types_survive_reload() {
    let raw = r#"{
        "settings": { "businessName": "Corner Print", "theme": "dark" },
        "entries": [
            { "id": "x", "date": "2024-03-01", "type": "refund", "amount": "12.5" }
        ]
    }"#;
    let parsed = LedgerDocument::parse_lenient(raw, &LedgerDocument::default());
    let doc = parsed.document;
    assert_eq!(doc.entries[0].kind, EntryKind::Expense);
    assert_eq!(doc.entries[0].amount, 12.5);
    assert!(doc.closed_days.is_empty());

    let json = doc.to_json().unwrap();
    assert!(json.contains("\"theme\":\"dark\""));
    assert!(json.contains("\"closedDays\":[]"));
}
