// ===============================
// src/feed.rs
// ===============================
//
// Feed adapter (replay):
// - Koneksi live ke TWS di luar crate ini. Yang dibaca di sini adalah capture
//   JSONL dari dua callback TWS: execDetails & commissionReport.
// - Satu file = satu sesi / akun. Commission map dibangun per file.
//
// Contoh baris:
//   {"ExecDetails":{"contract":{...},"execution":{...}}}
//   {"CommissionReport":{"execId":"0001f4e8.65e1.01.01","commission":0.65,"currency":"USD","realizedPNL":1.7976931348623157e308}}
//   "ExecDetailsEnd"
//
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::{debug, info, warn};

use crate::domain::{CommissionReport, Fill, SourceBatch};
use crate::error::LedgerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeedEvent {
    ExecDetails(Fill),
    CommissionReport(CommissionReport),
    ExecDetailsEnd,
}

/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<FeedEvent>, LedgerError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| LedgerError::Json { line: line_no, source })
}

/// Folds a stream of events into one batch. A later commission report for the
/// same exec id replaces the earlier one.
pub fn fold_events<I>(label: &str, events: I) -> SourceBatch
where
    I: IntoIterator<Item = FeedEvent>,
{
    let mut batch = SourceBatch { label: label.to_string(), ..Default::default() };
    let mut ended = false;
    for ev in events {
        match ev {
            FeedEvent::ExecDetails(fill) => {
                if ended {
                    debug!(source = %label, exec_id = %fill.execution.exec_id, "exec after end marker");
                }
                batch.fills.push(fill);
            }
            FeedEvent::CommissionReport(report) => {
                batch.commissions.insert(report.exec_id.clone(), report);
            }
            FeedEvent::ExecDetailsEnd => ended = true,
        }
    }
    if !ended {
        warn!(source = %label, "capture has no ExecDetailsEnd, may be incomplete");
    }
    batch
}

/// Reads one capture file. Malformed lines are logged and skipped.
pub async fn load_batch(path: &str) -> Result<SourceBatch, LedgerError> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut events = Vec::new();
    let mut line_no = 0usize;
    let mut skipped = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line, line_no) {
            Ok(Some(ev)) => events.push(ev),
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                warn!(%path, error = %e, "feed: skip line");
            }
        }
    }

    let label = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let batch = fold_events(&label, events);
    info!(
        %path,
        fills = batch.fills.len(),
        commissions = batch.commissions.len(),
        skipped,
        "feed: capture loaded"
    );
    Ok(batch)
}
