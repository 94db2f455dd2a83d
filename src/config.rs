// ===============================
// src/config.rs
// ===============================
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
use std::env;

use clap::Parser;
use dotenvy::dotenv;

#[derive(Parser, Clone, Debug)]
#[command(name = "ib_trade_ledger", version, about = "Build a normalized trade ledger from captured TWS fills")]
pub struct Args {
    /// Captured event stream (JSONL), satu per akun / sesi TWS
    #[arg(long = "source", env = "SOURCES", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Ledger file; rows are appended
    #[arg(long, env = "LEDGER_FILE", default_value = "trade_data.jsonl")]
    pub output: String,

    /// Prometheus textfile written at the end of the run
    #[arg(long, env = "METRICS_FILE")]
    pub metrics_file: Option<String>,

    /// Run the pipeline but do not write the ledger
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Knobs for the reconciliation engine (dibaca dari ENV, lihat `from_env`).
#[derive(Clone, Debug, PartialEq)]
pub struct EngineCfg {
    /// Routing exchange that marks the primary (rollup) leg of a combo.
    pub smart_exchange: String,
    /// Substring of orderRef that turns on the unrealized PnL column.
    pub unrealized_marker: String,
    pub contract_multiplier: f64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            smart_exchange: "SMART".to_string(),
            unrealized_marker: "OptTrader".to_string(),
            contract_multiplier: 100.0,
        }
    }
}

impl EngineCfg {
    pub fn from_env() -> Self {
        let def = Self::default();
        let smart_exchange = env::var("SMART_EXCHANGE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(def.smart_exchange);
        let unrealized_marker = env::var("UNREALIZED_MARKER")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(def.unrealized_marker);
        let contract_multiplier = env::var("CONTRACT_MULTIPLIER")
            .ok()
            .and_then(|x| x.parse().ok())
            .unwrap_or(def.contract_multiplier);

        Self { smart_exchange, unrealized_marker, contract_multiplier }
    }
}

pub fn load() -> (Args, EngineCfg) {
    // Pastikan .env dibaca dulu (agar SOURCES, LEDGER_FILE, dll ter-load)
    let _ = dotenv();

    let mut args = Args::parse();
    // SOURCES="a.jsonl, b.jsonl" -> buang spasi & entri kosong
    args.sources = args
        .sources
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let cfg = EngineCfg::from_env();
    (args, cfg)
}
