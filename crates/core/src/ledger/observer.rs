//! Post-commit notification of ledger entries.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use super::types::LedgerEntry;

/// Failure reported by an observer. Logged, never propagated.
#[derive(Debug, Error)]
#[error("Observer failed: {0}")]
pub struct ObserverError(pub String);

/// Receives every entry after the unit that wrote it has committed.
#[async_trait]
pub trait LedgerObserver: Send + Sync {
    /// Called once per committed entry.
    async fn entry_committed(&self, entry: &LedgerEntry) -> Result<(), ObserverError>;
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl LedgerObserver for NoopObserver {
    async fn entry_committed(&self, _entry: &LedgerEntry) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Hands each committed entry to `observer`, logging failures.
pub(crate) async fn notify_committed(observer: &dyn LedgerObserver, entries: &[LedgerEntry]) {
    for entry in entries {
        if let Err(e) = observer.entry_committed(entry).await {
            warn!(entry_id = entry.id, kind = %entry.kind, error = %e, "Ledger observer failed");
        }
    }
}
