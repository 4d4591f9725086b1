#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use shop_ledger::{
    core::FixedClock,
    ledger::{EntryKind, LedgerEntry},
    storage::{FileKeyValueStore, InMemoryObjectStore, SyncAdapter, SyncOptions},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that is removed when the test binary exits.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
}

pub fn options() -> SyncOptions {
    SyncOptions {
        init_timeout: Duration::from_millis(500),
        business_name: "Corner Print".into(),
        ..SyncOptions::default()
    }
}

/// Adapter over a file-backed cache in `base` and the given remote store.
pub fn adapter_in(base: &PathBuf, remote: Arc<InMemoryObjectStore>) -> SyncAdapter {
    let cache = FileKeyValueStore::new(base.join("cache")).expect("create cache");
    SyncAdapter::new(
        remote,
        Arc::new(cache),
        Arc::new(FixedClock::on(today())),
        options(),
    )
}

pub fn entry(id: &str, date: &str, kind: EntryKind, amount: f64) -> LedgerEntry {
    LedgerEntry {
        id: id.into(),
        date: date.into(),
        kind,
        amount,
        category: String::new(),
        payment_mode: None,
        note: String::new(),
        created_at: None,
        updated_at: None,
    }
}
