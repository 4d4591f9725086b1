//! Keeps the ledger document in the remote object store and mirrors it into
//! the device cache.
//!
//! Reads never fail: when the remote side cannot be reached the cached copy
//! is used, and when that is missing or unreadable a freshly seeded document
//! is returned. Writes try the cache first and still go to the remote store
//! when the cache rejects them.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::core::time::Clock;
use crate::ledger::LedgerDocument;
use crate::storage::credentials::{Credential, TokenGrant, TokenSource};
use crate::storage::{
    KeyValueStore, RemoteError, RemoteObjectStore, SyncError, CREDENTIAL_KEY, DOCUMENT_KEY,
    REMOTE_ID_KEY,
};

/// Lifecycle of the remote client within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub file_name: String,
    pub init_timeout: Duration,
    pub business_name: String,
    pub currency: String,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_name: config.remote_file_name.clone(),
            init_timeout: config.init_timeout(),
            business_name: config.business_name.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Document used for new remote objects and when nothing usable is stored.
    pub fn seed_document(&self) -> LedgerDocument {
        LedgerDocument::seeded(&self.business_name, &self.currency)
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSource {
    Remote,
    LocalCache,
    Seeded,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub document: LedgerDocument,
    pub source: DocumentSource,
    /// Repairs and fallbacks applied while loading.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveStrategy {
    CachedId,
    SearchByName,
    CreateNew,
}

const RESOLUTION_ORDER: [ResolveStrategy; 3] = [
    ResolveStrategy::CachedId,
    ResolveStrategy::SearchByName,
    ResolveStrategy::CreateNew,
];

#[derive(Debug)]
struct AdapterState {
    client: ClientState,
    credential: Option<Credential>,
    object_id: Option<String>,
}

pub struct SyncAdapter {
    remote: Arc<dyn RemoteObjectStore>,
    cache: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    token_source: Option<Arc<dyn TokenSource>>,
    options: SyncOptions,
    state: Mutex<AdapterState>,
    ready: Condvar,
    save_lock: Mutex<()>,
}

impl SyncAdapter {
    pub fn new(
        remote: Arc<dyn RemoteObjectStore>,
        cache: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        options: SyncOptions,
    ) -> Self {
        Self {
            remote,
            cache,
            clock,
            token_source: None,
            options,
            state: Mutex::new(AdapterState {
                client: ClientState::Uninitialized,
                credential: None,
                object_id: None,
            }),
            ready: Condvar::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Enables silent token refresh during initialization and when the
    /// cached credential has expired.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn client_state(&self) -> ClientState {
        self.lock_state().client
    }

    /// Restores the cached credential (or obtains one silently) and the
    /// cached remote object id, then wakes every caller waiting for readiness.
    /// Only the first call does any work.
    pub fn initialize(&self) {
        {
            let mut state = self.lock_state();
            if state.client != ClientState::Uninitialized {
                return;
            }
            state.client = ClientState::Initializing;
        }

        let credential = self.restore_credential();
        let object_id = match self.cache.get(REMOTE_ID_KEY) {
            Ok(value) => value.filter(|id| !id.trim().is_empty()),
            Err(err) => {
                warn!(%err, "Could not read the cached remote object id.");
                None
            }
        };

        let signed_in = {
            let mut state = self.lock_state();
            if state.credential.is_none() {
                state.credential = credential;
            }
            if state.object_id.is_none() {
                state.object_id = object_id;
            }
            state.client = ClientState::Ready;
            state.credential.is_some()
        };
        self.ready.notify_all();
        info!(signed_in, "Remote client ready.");
    }

    /// Blocks until the client is ready or the configured timeout elapses.
    /// Returns whether the client became ready.
    pub fn wait_until_ready(&self) -> bool {
        let state = self.lock_state();
        let (state, _) = self
            .ready
            .wait_timeout_while(state, self.options.init_timeout, |s| {
                s.client != ClientState::Ready
            })
            .unwrap_or_else(PoisonError::into_inner);
        state.client == ClientState::Ready
    }

    pub fn is_signed_in(&self) -> bool {
        let now = self.clock.now();
        self.lock_state()
            .credential
            .as_ref()
            .is_some_and(|credential| credential.is_valid_at(now))
    }

    /// Caches the credential produced by an interactive authorization flow.
    pub fn sign_in(&self, grant: TokenGrant) -> Result<(), SyncError> {
        let credential = Credential::from_grant(&grant, self.clock.now());
        self.cache
            .set(CREDENTIAL_KEY, &serde_json::to_string(&credential)?)?;
        info!(expires_at = %credential.expires_at, "Signed in to remote storage.");
        self.lock_state().credential = Some(credential);
        Ok(())
    }

    /// Drops the credential and the cached remote object id.
    pub fn sign_out(&self) -> Result<(), SyncError> {
        {
            let mut state = self.lock_state();
            state.credential = None;
            state.object_id = None;
        }
        self.cache.remove(CREDENTIAL_KEY)?;
        self.cache.remove(REMOTE_ID_KEY)?;
        info!("Signed out of remote storage.");
        Ok(())
    }

    /// Loads the document, preferring the remote copy. Never fails.
    pub fn fetch_document(&self) -> LoadReport {
        if !self.wait_until_ready() {
            warn!(
                timeout_ms = self.options.init_timeout.as_millis() as u64,
                "Remote client not ready in time; continuing without it."
            );
        }

        let Some(token) = self.current_token() else {
            warn!("No credential; loading the document from the local cache only.");
            return self.load_local(Vec::new());
        };

        match self.load_remote(&token) {
            Ok(report) => report,
            Err(err) => {
                error!(%err, "Remote read failed; falling back to the local cache.");
                self.load_local(vec![format!("remote copy unavailable: {err}")])
            }
        }
    }

    /// Writes the document to the cache, then replaces the remote copy.
    ///
    /// `SyncError::NotAuthenticated` and `SyncError::Remote` both mean the
    /// cached copy was already updated. `SyncError::LocalCacheFailed` means
    /// only the remote copy was. `SyncError::Local` means nothing was saved.
    /// Concurrent saves run one at a time.
    pub fn save_document(&self, document: &LedgerDocument) -> Result<(), SyncError> {
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let json = document.to_json()?;
        let local = self.cache.set(DOCUMENT_KEY, &json);
        match &local {
            Ok(()) => debug!(entries = document.entry_count(), "Document written to local cache."),
            Err(err) => warn!(%err, "Local cache write failed; trying remote storage."),
        }

        if !self.wait_until_ready() {
            warn!("Remote client not ready in time; saving locally only.");
        }
        let Some(token) = self.current_token() else {
            local?;
            return Err(SyncError::NotAuthenticated);
        };

        let result = self
            .resolve_object_id(&token)
            .and_then(|id| self.remote.overwrite(&token, &id, &json));
        match (result, local) {
            (Ok(()), Ok(())) => {
                info!(file = %self.options.file_name, "Document saved to remote storage.");
                Ok(())
            }
            (Ok(()), Err(err)) => {
                info!(file = %self.options.file_name, "Document saved to remote storage only.");
                Err(SyncError::LocalCacheFailed(err))
            }
            (Err(err), Ok(())) => {
                error!(%err, "Remote save failed; the local cache holds the latest copy.");
                Err(err.into())
            }
            (Err(remote_err), Err(local_err)) => {
                error!(%remote_err, %local_err, "Document was not saved anywhere.");
                Err(local_err.into())
            }
        }
    }

    fn load_remote(&self, token: &str) -> Result<LoadReport, RemoteError> {
        let id = self.resolve_object_id(token)?;
        let text = self.remote.read(token, &id)?;
        let parsed = LedgerDocument::parse_lenient(&text, &self.options.seed_document());
        for warning in &parsed.warnings {
            warn!(%warning, "Repaired remote document.");
        }
        let mut warnings = parsed.warnings;

        match parsed.document.to_json() {
            Ok(json) => {
                if let Err(err) = self.cache.set(DOCUMENT_KEY, &json) {
                    warn!(%err, "Could not refresh the local backup.");
                    warnings.push(format!("local backup not refreshed: {err}"));
                }
            }
            Err(err) => warn!(%err, "Could not serialize the local backup."),
        }

        Ok(LoadReport {
            document: parsed.document,
            source: DocumentSource::Remote,
            warnings,
        })
    }

    fn load_local(&self, mut warnings: Vec<String>) -> LoadReport {
        let seed = self.options.seed_document();
        match self.cache.get(DOCUMENT_KEY) {
            Ok(Some(text)) => {
                let parsed = LedgerDocument::parse_lenient(&text, &seed);
                for warning in &parsed.warnings {
                    warn!(%warning, "Repaired cached document.");
                }
                warnings.extend(parsed.warnings);
                LoadReport {
                    document: parsed.document,
                    source: DocumentSource::LocalCache,
                    warnings,
                }
            }
            Ok(None) => {
                debug!("No cached document; starting from a seeded one.");
                LoadReport {
                    document: seed,
                    source: DocumentSource::Seeded,
                    warnings,
                }
            }
            Err(err) => {
                warn!(%err, "Local cache unreadable; starting from a seeded document.");
                warnings.push(format!("local cache unreadable: {err}"));
                LoadReport {
                    document: seed,
                    source: DocumentSource::Seeded,
                    warnings,
                }
            }
        }
    }

    fn resolve_object_id(&self, token: &str) -> Result<String, RemoteError> {
        for strategy in RESOLUTION_ORDER {
            if let Some(id) = self.try_resolve(strategy, token)? {
                self.remember_object_id(&id);
                return Ok(id);
            }
        }
        Err(RemoteError::NotFound(self.options.file_name.clone()))
    }

    fn try_resolve(
        &self,
        strategy: ResolveStrategy,
        token: &str,
    ) -> Result<Option<String>, RemoteError> {
        let name = self.options.file_name.as_str();
        match strategy {
            ResolveStrategy::CachedId => {
                let cached = self.lock_state().object_id.clone();
                let Some(id) = cached else {
                    return Ok(None);
                };
                match self.remote.is_live(token, &id) {
                    Ok(true) => Ok(Some(id)),
                    Ok(false) => {
                        info!(%id, "Cached remote object is gone; searching by name.");
                        Ok(None)
                    }
                    Err(err) => {
                        warn!(%id, %err, "Cached remote object check failed; searching by name.");
                        Ok(None)
                    }
                }
            }
            ResolveStrategy::SearchByName => {
                let found = self.remote.find_by_name(token, name)?;
                if let Some(id) = &found {
                    debug!(%id, file = name, "Found remote object by name.");
                }
                Ok(found)
            }
            ResolveStrategy::CreateNew => {
                let seed = self
                    .options
                    .seed_document()
                    .to_json()
                    .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
                let id = self.remote.create(token, name, &seed)?;
                info!(%id, file = name, "Created remote object.");
                Ok(Some(id))
            }
        }
    }

    fn remember_object_id(&self, id: &str) {
        {
            let mut state = self.lock_state();
            if state.object_id.as_deref() == Some(id) {
                return;
            }
            state.object_id = Some(id.to_string());
        }
        if let Err(err) = self.cache.set(REMOTE_ID_KEY, id) {
            warn!(%err, "Could not cache the remote object id.");
        }
    }

    /// A valid bearer token, refreshing silently when the cached one expired.
    fn current_token(&self) -> Option<String> {
        let now = self.clock.now();
        {
            let state = self.lock_state();
            if let Some(credential) = state
                .credential
                .as_ref()
                .filter(|credential| credential.is_valid_at(now))
            {
                return Some(credential.access_token.clone());
            }
        }
        let refreshed = self.refresh_silently()?;
        let token = refreshed.access_token.clone();
        self.lock_state().credential = Some(refreshed);
        Some(token)
    }

    fn restore_credential(&self) -> Option<Credential> {
        let now = self.clock.now();
        match self.cache.get(CREDENTIAL_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Credential>(&raw) {
                Ok(credential) if credential.is_valid_at(now) => {
                    debug!("Reusing cached credential.");
                    return Some(credential);
                }
                Ok(_) => debug!("Cached credential expired."),
                Err(err) => warn!(%err, "Cached credential unreadable; ignoring it."),
            },
            Ok(None) => {}
            Err(err) => warn!(%err, "Could not read the cached credential."),
        }
        self.refresh_silently()
    }

    fn refresh_silently(&self) -> Option<Credential> {
        let source = self.token_source.as_ref()?;
        match source.refresh_silently() {
            Ok(Some(grant)) => {
                let credential = Credential::from_grant(&grant, self.clock.now());
                match serde_json::to_string(&credential) {
                    Ok(json) => {
                        if let Err(err) = self.cache.set(CREDENTIAL_KEY, &json) {
                            warn!(%err, "Could not cache the refreshed credential.");
                        }
                    }
                    Err(err) => warn!(%err, "Could not serialize the refreshed credential."),
                }
                debug!("Obtained a credential silently.");
                Some(credential)
            }
            Ok(None) => {
                debug!("Silent sign-in needs user consent.");
                None
            }
            Err(err) => {
                warn!(%err, "Silent token refresh failed.");
                None
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AdapterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
