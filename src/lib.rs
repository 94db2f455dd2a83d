// ===============================
// src/lib.rs
// ===============================
pub mod domain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod normalizer;   // fill + commission -> TradeRecord
pub mod assignment;   // ASSIGNED / EXPIRED
pub mod combo;        // multi-leg combo -> primary SMART leg
pub mod pipeline;
pub mod feed;         // replay capture JSONL
pub mod recorder;     // ledger JSONL (append)
