use crate::core::services::{AccessService, ServiceError, ServiceResult};
use crate::ledger::Settings;

/// Tracks whether the current user has entered the PIN.
///
/// Adding entries is always allowed. Editing, deleting, changing closed days
/// and changing the PIN require an authenticated session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Verifies `pin` against the stored digest and opens the session on success.
    pub fn unlock(&mut self, settings: &Settings, pin: &str) -> ServiceResult<()> {
        if AccessService::verify_pin(settings, pin) {
            self.authenticated = true;
            tracing::debug!("Session unlocked.");
            Ok(())
        } else {
            tracing::warn!("Rejected PIN attempt.");
            Err(ServiceError::IncorrectPin)
        }
    }

    pub fn grant(&mut self) {
        self.authenticated = true;
    }

    pub fn lock(&mut self) {
        self.authenticated = false;
    }

    pub fn require_authenticated(&self) -> ServiceResult<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(ServiceError::AuthenticationRequired)
        }
    }
}
