//! In-process collaborators used by tests, benches, and offline runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::LedgerError;
use crate::storage::{KeyValueStore, RemoteError, RemoteObjectStore};

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail with a persistence error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence(format!("write to `{key}` rejected")));
        }
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        self.values().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    name: String,
    content: String,
    trashed: bool,
}

/// Number of calls made against an [`InMemoryObjectStore`], per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub is_live: usize,
    pub find_by_name: usize,
    pub create: usize,
    pub read: usize,
    pub overwrite: usize,
}

#[derive(Debug, Default)]
struct ObjectState {
    objects: BTreeMap<String, StoredObject>,
    next_id: u64,
    calls: CallCounts,
}

/// Remote object store held in memory, with switchable failures.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    state: Mutex<ObjectState>,
    unavailable: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    required_token: Mutex<Option<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the network were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Rejects calls whose bearer token differs from `token`.
    pub fn require_token(&self, token: &str) {
        *self
            .required_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    /// Stores an object directly, bypassing the call counters.
    pub fn insert(&self, name: &str, content: &str) -> String {
        let mut state = self.state();
        Self::allocate(&mut state, name, content)
    }

    pub fn trash(&self, id: &str) {
        if let Some(object) = self.state().objects.get_mut(id) {
            object.trashed = true;
        }
    }

    pub fn content_of(&self, id: &str) -> Option<String> {
        self.state().objects.get(id).map(|object| object.content.clone())
    }

    /// Content of the first live object named `name`.
    pub fn content_named(&self, name: &str) -> Option<String> {
        self.state()
            .objects
            .values()
            .find(|object| object.name == name && !object.trashed)
            .map(|object| object.content.clone())
    }

    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    fn state(&self) -> MutexGuard<'_, ObjectState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate(state: &mut ObjectState, name: &str, content: &str) -> String {
        state.next_id += 1;
        let id = format!("obj-{}", state.next_id);
        state.objects.insert(
            id.clone(),
            StoredObject {
                name: name.to_string(),
                content: content.to_string(),
                trashed: false,
            },
        );
        id
    }

    fn check(&self, token: &str) -> Result<(), RemoteError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("store is offline".into()));
        }
        let required = self
            .required_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match required.as_deref() {
            Some(expected) if expected != token => Err(RemoteError::Status {
                status: 401,
                body: "invalid credentials".into(),
            }),
            _ => Ok(()),
        }
    }
}

impl RemoteObjectStore for InMemoryObjectStore {
    fn is_live(&self, token: &str, id: &str) -> Result<bool, RemoteError> {
        self.state().calls.is_live += 1;
        self.check(token)?;
        Ok(self
            .state()
            .objects
            .get(id)
            .map_or(false, |object| !object.trashed))
    }

    fn find_by_name(&self, token: &str, name: &str) -> Result<Option<String>, RemoteError> {
        self.state().calls.find_by_name += 1;
        self.check(token)?;
        Ok(self
            .state()
            .objects
            .iter()
            .find(|(_, object)| object.name == name && !object.trashed)
            .map(|(id, _)| id.clone()))
    }

    fn create(&self, token: &str, name: &str, content: &str) -> Result<String, RemoteError> {
        self.state().calls.create += 1;
        self.check(token)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                body: "create failed".into(),
            });
        }
        let mut state = self.state();
        Ok(Self::allocate(&mut state, name, content))
    }

    fn read(&self, token: &str, id: &str) -> Result<String, RemoteError> {
        self.state().calls.read += 1;
        self.check(token)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                body: "read failed".into(),
            });
        }
        self.state()
            .objects
            .get(id)
            .map(|object| object.content.clone())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn overwrite(&self, token: &str, id: &str, content: &str) -> Result<(), RemoteError> {
        self.state().calls.overwrite += 1;
        self.check(token)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 500,
                body: "write failed".into(),
            });
        }
        let mut state = self.state();
        let object = state
            .objects
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        object.content = content.to_string();
        Ok(())
    }
}
