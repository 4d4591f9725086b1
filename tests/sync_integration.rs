mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{adapter_in, entry, temp_base};
use shop_ledger::{
    ledger::{EntryKind, LedgerDocument},
    storage::{
        ClientState, DocumentSource, FileKeyValueStore, InMemoryObjectStore, KeyValueStore,
        SyncError, TokenGrant, DOCUMENT_KEY, REMOTE_ID_KEY,
    },
};

fn document(amounts: &[f64]) -> LedgerDocument {
    let mut doc = LedgerDocument::seeded("Corner Print", "INR");
    for (idx, amount) in amounts.iter().enumerate() {
        doc.push_entry(entry(
            &format!("2024-03-15_{idx}"),
            "2024-03-15",
            EntryKind::Income,
            *amount,
        ));
    }
    doc
}

#[test]
fn offline_work_is_pushed_after_sign_in() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());
    let adapter = adapter_in(&base, remote.clone());
    adapter.initialize();

    let offline = document(&[10.0, 20.0]);
    assert!(matches!(
        adapter.save_document(&offline),
        Err(SyncError::NotAuthenticated)
    ));
    assert_eq!(remote.object_count(), 0);

    adapter.sign_in(TokenGrant::new("token", 3600)).unwrap();
    adapter.save_document(&offline).unwrap();

    let pushed = remote.content_named("expenses_data.json").unwrap();
    let parsed = LedgerDocument::parse_lenient(&pushed, &LedgerDocument::default());
    assert_eq!(parsed.document, offline);
}

#[test]
fn credential_and_object_id_survive_a_restart() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());

    let first = adapter_in(&base, remote.clone());
    first.initialize();
    first.sign_in(TokenGrant::new("token", 3600)).unwrap();
    first.save_document(&document(&[5.0])).unwrap();
    drop(first);

    let second = adapter_in(&base, remote.clone());
    second.initialize();
    assert!(second.is_signed_in());

    let report = second.fetch_document();
    assert_eq!(report.source, DocumentSource::Remote);
    assert_eq!(report.document.entry_count(), 1);
    let calls = remote.calls();
    assert_eq!(calls.create, 1);
    assert_eq!(calls.find_by_name, 1);
}

#[test]
fn fetch_waits_for_initialization_on_another_thread() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());
    let adapter = Arc::new(adapter_in(&base, remote));
    let cache = FileKeyValueStore::new(base.join("cache")).unwrap();
    cache
        .set(DOCUMENT_KEY, &document(&[1.0]).to_json().unwrap())
        .unwrap();

    let initializer = {
        let adapter = Arc::clone(&adapter);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            adapter.initialize();
        })
    };

    let report = adapter.fetch_document();
    assert_eq!(adapter.client_state(), ClientState::Ready);
    assert_eq!(report.source, DocumentSource::LocalCache);
    assert_eq!(report.document.entry_count(), 1);
    initializer.join().unwrap();
}

#[test]
fn concurrent_saves_all_land() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());
    let adapter = Arc::new(adapter_in(&base, remote.clone()));
    adapter.initialize();
    adapter.sign_in(TokenGrant::new("token", 3600)).unwrap();

    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let adapter = Arc::clone(&adapter);
            thread::spawn(move || adapter.save_document(&document(&vec![1.0; n])))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(remote.object_count(), 1);
    assert_eq!(remote.calls().create, 1);
    assert_eq!(remote.calls().overwrite, 4);
    let cache = FileKeyValueStore::new(base.join("cache")).unwrap();
    let cached = cache.get(DOCUMENT_KEY).unwrap().unwrap();
    let id = cache.get(REMOTE_ID_KEY).unwrap().unwrap();
    assert_eq!(remote.content_of(&id).unwrap(), cached);
}

#[test]
fn corrupt_local_cache_loads_seeded_document() {
    let base = temp_base();
    let remote = Arc::new(InMemoryObjectStore::new());
    let adapter = adapter_in(&base, remote);
    let cache = FileKeyValueStore::new(base.join("cache")).unwrap();
    cache.set(DOCUMENT_KEY, "{ broken").unwrap();

    adapter.initialize();
    let report = adapter.fetch_document();
    assert_eq!(report.source, DocumentSource::LocalCache);
    assert!(report.document.entries.is_empty());
    assert_eq!(
        report.document.settings.business_name.as_deref(),
        Some("Corner Print")
    );
    assert_eq!(report.warnings.len(), 1);
}
