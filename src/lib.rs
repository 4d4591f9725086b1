#![doc(test(attr(deny(warnings))))]

//! Shop Ledger keeps the income and expense records of a single shop in one
//! JSON document, produces date-bucketed financial summaries from it, and
//! synchronizes the document with a remote drive store while mirroring it to a
//! local cache.

pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Shop Ledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
