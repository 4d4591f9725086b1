//! Persistence collaborators: the device-local key-value cache, the remote
//! object store holding the whole ledger document, and the adapter that
//! keeps them in step.

pub mod credentials;
pub mod drive;
pub mod local_cache;
pub mod memory;
pub mod sync;

use thiserror::Error;

use crate::errors::LedgerError;

pub use credentials::{Credential, EnvTokenSource, TokenGrant, TokenSource};
pub use drive::DriveClient;
pub use local_cache::FileKeyValueStore;
pub use memory::{CallCounts, InMemoryObjectStore, MemoryKeyValueStore};
pub use sync::{ClientState, DocumentSource, LoadReport, SyncAdapter, SyncOptions};

/// Cache key of the last known document JSON.
pub const DOCUMENT_KEY: &str = "expenses_data";
/// Cache key of the remote object identifier.
pub const REMOTE_ID_KEY: &str = "drive_file_id";
/// Cache key of the serialized bearer credential.
pub const CREDENTIAL_KEY: &str = "drive_credential";

/// Durable string store scoped to this device.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;
    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), LedgerError>;
}

/// Object store addressed by durable identifiers. Every call carries the
/// caller's bearer token.
pub trait RemoteObjectStore: Send + Sync {
    /// Whether the object exists and has not been moved to the trash.
    fn is_live(&self, token: &str, id: &str) -> Result<bool, RemoteError>;
    fn find_by_name(&self, token: &str, name: &str) -> Result<Option<String>, RemoteError>;
    /// Creates an object holding `content` and returns its identifier.
    fn create(&self, token: &str, name: &str, content: &str) -> Result<String, RemoteError>;
    fn read(&self, token: &str, id: &str) -> Result<String, RemoteError>;
    fn overwrite(&self, token: &str, id: &str, content: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Remote object not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected remote response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The local cache was written but no remote sync happened.
    #[error("Not signed in; saved to this device only.")]
    NotAuthenticated,
    #[error("Sync failed: {0}")]
    Remote(#[from] RemoteError),
    /// The remote copy was saved but the device cache kept an older one.
    #[error("Saved to remote storage, but the local copy could not be updated: {0}")]
    LocalCacheFailed(LedgerError),
    #[error(transparent)]
    Local(#[from] LedgerError),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Local(LedgerError::Serde(err))
    }
}
