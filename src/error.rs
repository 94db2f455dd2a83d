// ===============================
// src/error.rs
// ===============================
use thiserror::Error;

/// Errors at the I/O edges (feed replay, ledger append, metrics export).
/// The reconciliation core itself never fails.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed event: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode ledger row: {0}")]
    Encode(#[source] serde_json::Error),
}
