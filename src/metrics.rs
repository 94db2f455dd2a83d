// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::LedgerError;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Normalizer --------
pub static FILLS_NORMALIZED: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("fills_normalized_total", "fills turned into ledger records").unwrap());

pub static COMMISSION_MISSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "commission_lookup_misses_total",
        "fills without a commission report (commission=0, realized PnL empty)",
    )
    .unwrap()
});

pub static SENTINEL_PNL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "realized_pnl_not_applicable_total",
        "realized PnL values dropped as the 'not applicable' sentinel",
    )
    .unwrap()
});

pub static TIME_PARSE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("timestamp_parse_failures_total", "unparseable timestamps (label: stage)"),
        &["stage"],
    )
    .unwrap()
});

// -------- Classifier / reconciler --------
pub static ACTION_RELABELS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("assignment_relabels_total", "actions rewritten by the assignment classifier"),
        &["action"],
    )
    .unwrap()
});

pub static COMBO_GROUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "combo_groups_total",
            "symbol+time groups by outcome (not_combo, folded, unresolved, no_primary)",
        ),
        &["outcome"],
    )
    .unwrap()
});

// -------- Output --------
pub static LEDGER_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ledger_records_total", "final ledger records by action"),
        &["action"],
    )
    .unwrap()
});

pub static LEDGER_ROWS_WRITTEN: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("ledger_rows_written_total", "rows appended to the ledger file").unwrap());

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(FILLS_NORMALIZED.clone())),
        REGISTRY.register(Box::new(COMMISSION_MISSES.clone())),
        REGISTRY.register(Box::new(SENTINEL_PNL.clone())),
        REGISTRY.register(Box::new(TIME_PARSE_FAILURES.clone())),
        REGISTRY.register(Box::new(ACTION_RELABELS.clone())),
        REGISTRY.register(Box::new(COMBO_GROUPS.clone())),
        REGISTRY.register(Box::new(LEDGER_ACTIONS.clone())),
        REGISTRY.register(Box::new(LEDGER_ROWS_WRITTEN.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

/// Batch run, bukan daemon: metrics ditulis ke file (node_exporter textfile collector).
pub async fn export_textfile(path: &str) -> Result<(), LedgerError> {
    let body = encode_metrics();
    tokio::fs::write(path, body).await?;
    Ok(())
}
