// ===============================
// src/combo.rs
// ===============================
//
// Rekonsiliasi combo multi-leg:
// - Group per (symbol, waktu). Group dengan harga negatif = combo.
// - Leg non-SMART: strike disortir, PnL dijumlah.
// - Leg SMART (primary) menerima deskriptor gabungan + net PnL; leg lain dibuang.
// - Gagal parse strike -> seluruh group lolos apa adanya (record tidak pernah hilang).
//
use ahash::AHashMap as HashMap;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineCfg;
use crate::domain::TradeRecord;
use crate::metrics::{COMBO_GROUPS, TIME_PARSE_FAILURES};
use crate::normalizer::DISPLAY_TIME_FMT;

/// Legacy category, passed through untouched and emitted after grouped records.
pub const PLURAL_STOCK_MARKER: &str = "STOCKS";

#[derive(Debug, Error, PartialEq)]
pub enum StrikeParseError {
    #[error("no strike token in '{0}'")]
    Missing(String),
    #[error("strike '{token}' in '{info}' is not a number")]
    NotNumeric { info: String, token: String },
}

/// Result of looking at one (symbol, time) group.
#[derive(Debug)]
pub enum GroupOutcome {
    /// Single record or no negative price: emitted unchanged.
    NotCombo(Vec<TradeRecord>),
    /// Combo folded into its SMART leg(s); the other legs leave the ledger.
    ComboFolded { primaries: Vec<TradeRecord>, dropped_legs: Vec<TradeRecord> },
    /// Strike token could not be read: whole group emitted unchanged.
    ComboUnresolved(Vec<TradeRecord>),
    /// Combo evidence but no SMART leg to fold into: whole group emitted unchanged.
    ComboWithoutPrimary(Vec<TradeRecord>),
}

impl GroupOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            GroupOutcome::NotCombo(_) => "not_combo",
            GroupOutcome::ComboFolded { .. } => "folded",
            GroupOutcome::ComboUnresolved(_) => "unresolved",
            GroupOutcome::ComboWithoutPrimary(_) => "no_primary",
        }
    }

    /// Records that go into the ledger.
    pub fn into_ledger(self) -> Vec<TradeRecord> {
        match self {
            GroupOutcome::NotCombo(r)
            | GroupOutcome::ComboUnresolved(r)
            | GroupOutcome::ComboWithoutPrimary(r) => r,
            GroupOutcome::ComboFolded { primaries, .. } => primaries,
        }
    }
}

/// Second whitespace token of Security_Info, e.g. `MAR'15'24 100 CALL` -> 100.0
pub fn parse_strike(security_info: &str) -> Result<f64, StrikeParseError> {
    let token = security_info
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| StrikeParseError::Missing(security_info.to_string()))?;
    // "NaN" / "inf" lolos parse f64, tapi bukan strike
    match token.parse::<f64>() {
        Ok(strike) if strike.is_finite() => Ok(strike),
        _ => Err(StrikeParseError::NotNumeric {
            info: security_info.to_string(),
            token: token.to_string(),
        }),
    }
}

/// `<expiry> <high>/<low>` from the two highest strikes; expiry taken from the
/// lowest-strike leg. Empty when there is nothing to describe.
fn combined_descriptor(legs_by_strike: &[(f64, &TradeRecord)]) -> String {
    let expiry = legs_by_strike
        .first()
        .and_then(|(_, leg)| leg.security_info.split_whitespace().next())
        .unwrap_or("");
    if expiry.is_empty() {
        return String::new();
    }
    let strikes: Vec<String> = legs_by_strike
        .iter()
        .rev()
        .take(2)
        .map(|(s, _)| format!("{}", s.trunc() as i64))
        .collect();
    format!("{} {}", expiry, strikes.join("/"))
}

pub fn resolve_group(group: Vec<TradeRecord>, cfg: &EngineCfg) -> GroupOutcome {
    if group.len() <= 1 || !group.iter().any(|r| r.price < 0.0) {
        return GroupOutcome::NotCombo(group);
    }

    let is_primary = |r: &TradeRecord| r.exchange == cfg.smart_exchange;

    // Semua perhitungan di atas referensi dulu; group baru dipindah setelah aman.
    let legs: Result<Vec<(f64, &TradeRecord)>, StrikeParseError> = group
        .iter()
        .filter(|r| !is_primary(r))
        .map(|r| parse_strike(&r.security_info).map(|s| (s, r)))
        .collect();
    let mut legs = match legs {
        Ok(legs) => legs,
        Err(e) => {
            warn!(symbol = %group[0].symbol, time = %group[0].date_time, error = %e, "combo strike unreadable, group kept as is");
            return GroupOutcome::ComboUnresolved(group);
        }
    };
    legs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let descriptor = combined_descriptor(&legs);
    let net_pnl: f64 = legs.iter().filter_map(|(_, r)| r.realized_pnl).sum();

    if !group.iter().any(is_primary) {
        debug!(symbol = %group[0].symbol, time = %group[0].date_time, "combo without SMART leg");
        return GroupOutcome::ComboWithoutPrimary(group);
    }

    let (mut primaries, dropped_legs): (Vec<_>, Vec<_>) = group.into_iter().partition(is_primary);
    for primary in primaries.iter_mut() {
        if !descriptor.is_empty() {
            primary.security_info = descriptor.clone();
        }
        if net_pnl != 0.0 {
            primary.realized_pnl = Some(primary.realized_pnl.map_or(net_pnl, |p| p + net_pnl));
        }
        debug!(
            symbol = %primary.symbol,
            time = %primary.date_time,
            info = %primary.security_info,
            net_pnl,
            legs = dropped_legs.len(),
            "combo folded into primary leg"
        );
    }

    GroupOutcome::ComboFolded { primaries, dropped_legs }
}

/// Groups by (symbol, time), folds combos, and returns the final ledger:
/// grouped records in first-seen order, then `STOCKS` records, then records
/// whose time could not be parsed.
pub fn reconcile_combos(records: Vec<TradeRecord>, cfg: &EngineCfg) -> Vec<TradeRecord> {
    let mut plural_stock = Vec::new();
    let mut unparsed_time = Vec::new();
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<TradeRecord>> = HashMap::new();

    for rec in records {
        if rec.security_info == PLURAL_STOCK_MARKER {
            plural_stock.push(rec);
            continue;
        }
        match NaiveDateTime::parse_from_str(&rec.date_time, DISPLAY_TIME_FMT) {
            Ok(t) => {
                let key = (rec.symbol.clone(), t.format(DISPLAY_TIME_FMT).to_string());
                groups
                    .entry(key.clone())
                    .or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    })
                    .push(rec);
            }
            Err(_) => {
                TIME_PARSE_FAILURES.with_label_values(&["combo"]).inc();
                debug!(symbol = %rec.symbol, time = %rec.date_time, "time not parseable, record passed through");
                unparsed_time.push(rec);
            }
        }
    }

    let mut ledger = Vec::new();
    for key in order {
        let Some(group) = groups.remove(&key) else { continue };
        let outcome = resolve_group(group, cfg);
        COMBO_GROUPS.with_label_values(&[outcome.label()]).inc();
        ledger.extend(outcome.into_ledger());
    }
    ledger.extend(plural_stock);
    ledger.extend(unparsed_time);
    ledger
}
