// ===============================
// src/pipeline.rs
// ===============================
use ahash::AHashMap as HashMap;
use tracing::info;

use crate::assignment::classify_assignments;
use crate::combo::reconcile_combos;
use crate::config::EngineCfg;
use crate::domain::{Action, SourceBatch, TradeRecord};
use crate::metrics::LEDGER_ACTIONS;
use crate::normalizer::normalize_batch;

/// Normalize every source with its own commission map, concatenated in source order.
pub fn normalize_sources(batches: &[SourceBatch], cfg: &EngineCfg) -> Vec<TradeRecord> {
    let mut all = Vec::new();
    for batch in batches {
        let records = normalize_batch(batch, cfg);
        if records.is_empty() {
            info!(source = %batch.label, "no trades found");
        } else {
            info!(source = %batch.label, trades = records.len(), "retrieved trades");
        }
        all.extend(records);
    }
    all
}

/// Assignment classification then combo reconciliation over the whole batch.
pub fn build_ledger(mut records: Vec<TradeRecord>, cfg: &EngineCfg) -> Vec<TradeRecord> {
    let relabeled = classify_assignments(&mut records);
    let input = records.len();
    let ledger = reconcile_combos(records, cfg);
    info!(input, relabeled, output = ledger.len(), "ledger built");

    for rec in &ledger {
        LEDGER_ACTIONS.with_label_values(&[rec.action.as_str()]).inc();
    }
    ledger
}

pub fn run(batches: &[SourceBatch], cfg: &EngineCfg) -> Vec<TradeRecord> {
    build_ledger(normalize_sources(batches, cfg), cfg)
}

#[derive(Debug, Default, Clone)]
pub struct LedgerSummary {
    pub rows: usize,
    pub by_action: HashMap<Action, usize>,
    pub realized_pnl: f64,
    pub commission: f64,
}

pub fn summarize(ledger: &[TradeRecord]) -> LedgerSummary {
    let mut s = LedgerSummary { rows: ledger.len(), ..Default::default() };
    for rec in ledger {
        *s.by_action.entry(rec.action).or_insert(0) += 1;
        s.realized_pnl += rec.realized_pnl.unwrap_or(0.0);
        s.commission += rec.commission;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommissionMap, CommissionReport, Contract, Execution, Fill, PnlValue};

    fn fill(exec_id: &str, sec_type: &str, strike: f64, side: &str, price: f64, exchange: &str) -> Fill {
        Fill {
            contract: Contract {
                symbol: "XYZ".into(),
                sec_type: sec_type.into(),
                currency: "USD".into(),
                exchange: exchange.into(),
                last_trade_date_or_contract_month: "20240315".into(),
                strike,
                right: "P".into(),
            },
            execution: Execution {
                exec_id: exec_id.into(),
                acct_number: "U9".into(),
                side: side.into(),
                time: "20240315  16:00:00".into(),
                shares: 100.0,
                price,
                order_ref: None,
            },
        }
    }

    #[test]
    fn assignment_survives_combo_pass() {
        // option expired at zero + stock delivered at the same second
        let batch = SourceBatch {
            label: "acct".into(),
            fills: vec![
                fill("o1", "OPT", 100.0, "SLD", 0.0, "SMART"),
                fill("s1", "STK", 0.0, "BOT", 100.0, "SMART"),
            ],
            commissions: CommissionMap::new(),
        };
        let ledger = run(&[batch], &EngineCfg::default());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].action, Action::Assigned);
        assert_eq!(ledger[1].action, Action::Bot);
        assert_eq!(ledger[1].security_info, "STOCK");
    }

    #[test]
    fn each_source_uses_its_own_commissions() {
        let mut comm_a = CommissionMap::new();
        comm_a.insert(
            "x1".into(),
            CommissionReport { exec_id: "x1".into(), commission: 1.0, currency: "USD".into(), realized_pnl: Some(PnlValue::Number(7.0)) },
        );
        let a = SourceBatch { label: "a".into(), fills: vec![fill("x1", "STK", 0.0, "BOT", 10.0, "SMART")], commissions: comm_a };
        // same exec id in the second source, but no report there
        let b = SourceBatch { label: "b".into(), fills: vec![fill("x1", "STK", 0.0, "SLD", 11.0, "SMART")], commissions: CommissionMap::new() };

        let records = normalize_sources(&[a, b], &EngineCfg::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].realized_pnl, Some(7.0));
        assert_eq!(records[1].commission, 0.0);
        assert_eq!(records[1].realized_pnl, None);
    }

    #[test]
    fn summary_counts_actions_and_money() {
        let batch = SourceBatch {
            label: "acct".into(),
            fills: vec![
                fill("o1", "OPT", 100.0, "SLD", 0.0, "SMART"),
                fill("s1", "STK", 0.0, "BOT", 100.0, "SMART"),
            ],
            commissions: CommissionMap::new(),
        };
        let s = summarize(&run(&[batch], &EngineCfg::default()));
        assert_eq!(s.rows, 2);
        assert_eq!(s.by_action.get(&Action::Assigned), Some(&1));
        assert_eq!(s.realized_pnl, 0.0);
    }
}
