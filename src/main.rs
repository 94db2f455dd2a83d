// ===============================
// src/main.rs
// ===============================
/*
 cd /home/kukuhtw/rust/ib_trade_ledger

 # dua akun TWS, ledger di-append ke trade_data.jsonl
 SOURCES=captures/acct1.jsonl,captures/acct2.jsonl cargo run --release

 # cek tanpa menulis ledger
 cargo run -- --source captures/acct1.jsonl --dry-run
*/
/*
=============================================================================
Project : ib_trade_ledger — brokerage fill reconciliation & trade ledger in Rust
Module  : <module_name>.rs
Version : 0.5.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Replays captured TWS execution & commission streams, normalizes
          fills, classifies assignments/expirations, folds multi-leg option
          combos into their SMART-routed primary leg, and appends the final
          ledger as JSONL.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ib_trade_ledger::{config, feed, metrics, pipeline, recorder};

#[tokio::main]
async fn main() {
    // ---- Logging ----
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ---- Load config ----
    let (args, cfg) = config::load();
    metrics::init();

    info!(
        sources = ?args.sources,
        output = %args.output,
        dry_run = args.dry_run,
        smart_exchange = %cfg.smart_exchange,
        unrealized_marker = %cfg.unrealized_marker,
        contract_multiplier = cfg.contract_multiplier,
        "startup config"
    );

    if args.sources.is_empty() {
        warn!("no sources configured (use --source or SOURCES=a.jsonl,b.jsonl)");
        return;
    }

    // ---- Feed: satu batch per sumber; sumber yang gagal dilewati ----
    let mut batches = Vec::with_capacity(args.sources.len());
    for path in &args.sources {
        match feed::load_batch(path).await {
            Ok(batch) => batches.push(batch),
            Err(e) => error!(%path, error = %e, "source failed, skipping"),
        }
    }

    // ---- Pipeline ----
    let records = pipeline::normalize_sources(&batches, &cfg);
    if records.is_empty() {
        info!("no trade data collected from any source");
    } else {
        let ledger = pipeline::build_ledger(records, &cfg);
        let summary = pipeline::summarize(&ledger);
        let by_action: Vec<(&str, usize)> = summary
            .by_action
            .iter()
            .map(|(a, n)| (a.as_str(), *n))
            .collect();
        info!(
            rows = summary.rows,
            actions = ?by_action,
            realized_pnl = summary.realized_pnl,
            commission = summary.commission,
            "ledger summary"
        );

        if args.dry_run {
            info!("dry run, ledger not written");
        } else if let Err(e) = recorder::append_ledger(&args.output, &ledger).await {
            error!(output = %args.output, error = %e, "error saving ledger");
        }
    }

    // ---- Metrics textfile ----
    if let Some(path) = &args.metrics_file {
        if let Err(e) = metrics::export_textfile(path).await {
            warn!(%path, error = %e, "metrics export failed");
        }
    }
}
