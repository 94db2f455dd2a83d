// ===============================
// src/assignment.rs
// ===============================
//
// Option/FOP tanpa harga & tanpa komisi:
//   ada stock fill di (symbol, waktu) yang sama -> ASSIGNED
//   tidak ada                                  -> EXPIRED (kecuali sudah BOT/SLD/ASSIGNED)
//
use ahash::AHashMap as HashMap;
use tracing::debug;

use crate::domain::{Action, TradeRecord};
use crate::metrics::ACTION_RELABELS;

/// What the classifier knows about one non-stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evidence {
    pub zero_price: bool,
    pub zero_commission: bool,
    pub stock_at_same_time: bool,
}

/// Decision table, evaluated once per non-stock record. `None` = leave as is.
///
/// | zero px & comm | stock at (sym, t) | current                | result   |
/// |----------------|-------------------|------------------------|----------|
/// | no             | any               | any                    | —        |
/// | yes            | yes               | any                    | ASSIGNED |
/// | yes            | no                | ASSIGNED / BOT / SLD   | —        |
/// | yes            | no                | EXPIRED                | EXPIRED  |
pub fn decide(evidence: Evidence, current: Action) -> Option<Action> {
    if !(evidence.zero_price && evidence.zero_commission) {
        return None;
    }
    if evidence.stock_at_same_time {
        return Some(Action::Assigned);
    }
    match current {
        Action::Assigned | Action::Bot | Action::Sld => None,
        Action::Expired => Some(Action::Expired),
    }
}

/// Annotates actions in place. Returns how many records actually changed.
pub fn classify_assignments(records: &mut [TradeRecord]) -> usize {
    // index stock fills: (symbol, date_time) -> posisi
    let mut stock_index: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, rec) in records.iter().enumerate() {
        if rec.is_stock() {
            stock_index
                .entry((rec.symbol.clone(), rec.date_time.clone()))
                .or_default()
                .push(i);
        }
    }

    let mut changed = 0;
    for rec in records.iter_mut().filter(|r| !r.is_stock()) {
        let key = (rec.symbol.clone(), rec.date_time.clone());
        let evidence = Evidence {
            zero_price: rec.price == 0.0,
            zero_commission: rec.commission == 0.0,
            stock_at_same_time: stock_index.contains_key(&key),
        };

        if let Some(next) = decide(evidence, rec.action) {
            if next != rec.action {
                debug!(
                    symbol = %rec.symbol,
                    time = %rec.date_time,
                    from = rec.action.as_str(),
                    to = next.as_str(),
                    stock_fills = stock_index.get(&key).map_or(0, Vec::len),
                    "action relabeled"
                );
                ACTION_RELABELS.with_label_values(&[next.as_str()]).inc();
                rec.action = next;
                changed += 1;
            }
        }
    }
    changed
}
