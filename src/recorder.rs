// ===============================
// src/recorder.rs
// ===============================
//
// Ledger writer JSONL:
// - Satu TradeRecord per baris, urutan kolom tetap (Account .. Exchange).
// - Append: baris lama di file tetap ada, batch baru ditambahkan di belakang.
// - Otomatis membuat parent directory jika belum ada.
//
use std::path::Path;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{error, info};

use crate::domain::TradeRecord;
use crate::error::LedgerError;
use crate::metrics::LEDGER_ROWS_WRITTEN;

async fn open_writer(path: &str) -> Result<BufWriter<tokio::fs::File>, LedgerError> {
    // Pastikan parent directory ada (kalau ada)
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(?e, %path, "recorder: create_dir_all failed");
            }
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

pub fn to_line(rec: &TradeRecord) -> Result<String, LedgerError> {
    serde_json::to_string(rec).map_err(LedgerError::Encode)
}

/// Appends the ledger; returns the number of rows written.
pub async fn append_ledger(path: &str, ledger: &[TradeRecord]) -> Result<usize, LedgerError> {
    if ledger.is_empty() {
        info!(%path, "recorder: no trade data to save");
        return Ok(0);
    }

    let existed = fs::try_exists(path).await.unwrap_or(false);
    let mut writer = open_writer(path).await?;

    // Encode semua dulu; baris rusak jangan sampai setengah tertulis
    let mut buf = String::new();
    for rec in ledger {
        buf.push_str(&to_line(rec)?);
        buf.push('\n');
    }
    writer.write_all(buf.as_bytes()).await?;
    writer.flush().await?;

    LEDGER_ROWS_WRITTEN.inc_by(ledger.len() as u64);
    if existed {
        info!(%path, rows = ledger.len(), "recorder: appended to existing ledger");
    } else {
        info!(%path, rows = ledger.len(), "recorder: created ledger");
    }
    Ok(ledger.len())
}
