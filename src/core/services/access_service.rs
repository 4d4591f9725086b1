//! PIN handling for the modification gate.

use sha2::{Digest, Sha256};

use crate::core::services::{ServiceError, ServiceResult};
use crate::ledger::Settings;

pub struct AccessService;

impl AccessService {
    /// Hex-encoded SHA-256 digest of the PIN.
    pub fn hash_pin(pin: &str) -> String {
        hex::encode(Sha256::digest(pin.as_bytes()))
    }

    /// Returns true when `pin` matches the stored digest.
    /// A document without a digest never verifies.
    pub fn verify_pin(settings: &Settings, pin: &str) -> bool {
        match settings.pin_hash.as_deref() {
            Some(stored) => constant_time_eq(stored.as_bytes(), Self::hash_pin(pin).as_bytes()),
            None => false,
        }
    }

    /// Stores the digest of `default_pin` when the document has none.
    /// Returns whether the settings changed and need to be saved.
    pub fn ensure_pin_hash(settings: &mut Settings, default_pin: &str) -> bool {
        let missing = settings
            .pin_hash
            .as_deref()
            .map_or(true, |hash| hash.trim().is_empty());
        if missing {
            settings.pin_hash = Some(Self::hash_pin(default_pin));
            tracing::info!("No PIN digest stored; installed the default PIN.");
        }
        missing
    }

    pub fn change_pin(
        settings: &mut Settings,
        current: &str,
        new_pin: &str,
        confirm: &str,
    ) -> ServiceResult<()> {
        if current.is_empty() || new_pin.is_empty() || confirm.is_empty() {
            return Err(ServiceError::Validation("Fill in all PIN fields.".into()));
        }
        if new_pin != confirm {
            return Err(ServiceError::PinMismatch);
        }
        if !Self::verify_pin(settings, current) {
            return Err(ServiceError::IncorrectPin);
        }
        settings.pin_hash = Some(Self::hash_pin(new_pin));
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
