// ===============================
// src/normalizer.rs
// ===============================
//
// Satu fill (contract + execution) + lookup commission -> satu TradeRecord.
// Tidak ada I/O; semua kegagalan parse jatuh ke nilai best-effort.
//
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::config::EngineCfg;
use crate::domain::{
    Action, CommissionMap, Fill, PnlValue, Right, SecType, Side, SourceBatch, TradeRecord,
    STOCK_INFO,
};
use crate::metrics::{COMMISSION_MISSES, FILLS_NORMALIZED, SENTINEL_PNL, TIME_PARSE_FAILURES};

/// TWS execution time, e.g. `20240301  15:30:00` (two spaces).
pub const BROKER_TIME_FMT: &str = "%Y%m%d  %H:%M:%S";
/// Ledger display format, also the grouping key for combos.
pub const DISPLAY_TIME_FMT: &str = "%d.%m.%Y %H:%M:%S";
/// TWS sends Double.MAX_VALUE for "not applicable".
pub const PNL_NOT_APPLICABLE: f64 = f64::MAX;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

pub fn normalize(fill: &Fill, commissions: &CommissionMap, cfg: &EngineCfg) -> TradeRecord {
    let contract = &fill.contract;
    let execution = &fill.execution;

    let mut action = Action::from(Side::from_code(&execution.side));

    // Commission & realized PnL (lookup by execId)
    let (commission, realized_pnl) = match commissions.get(&execution.exec_id) {
        Some(report) => (report.commission, resolve_pnl(report.realized_pnl.as_ref())),
        None => {
            COMMISSION_MISSES.inc();
            debug!(exec_id = %execution.exec_id, symbol = %contract.symbol, "no commission report");
            (0.0, None)
        }
    };

    if execution.price == 0.0 && commission == 0.0 {
        action = Action::Expired;
    }

    let unrealized_pnl = match &execution.order_ref {
        Some(tag) if tag.contains(&cfg.unrealized_marker) => {
            Some(execution.price * cfg.contract_multiplier - commission)
        }
        _ => None,
    };

    FILLS_NORMALIZED.inc();

    TradeRecord {
        account: execution.acct_number.clone(),
        action,
        date_time: format_exec_time(&execution.time),
        quantity: execution.shares,
        symbol: contract.symbol.clone(),
        security_info: security_info(fill),
        currency: contract.currency.clone(),
        price: execution.price,
        commission,
        unrealized_pnl,
        realized_pnl,
        exchange: contract.exchange.clone(),
    }
}

/// Normalize one source in fill arrival order.
pub fn normalize_batch(batch: &SourceBatch, cfg: &EngineCfg) -> Vec<TradeRecord> {
    batch
        .fills
        .iter()
        .map(|fill| normalize(fill, &batch.commissions, cfg))
        .collect()
}

/// Broker time -> display time; on failure the raw string is kept.
pub fn format_exec_time(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, BROKER_TIME_FMT) {
        Ok(dt) => dt.format(DISPLAY_TIME_FMT).to_string(),
        Err(e) => {
            TIME_PARSE_FAILURES.with_label_values(&["normalize"]).inc();
            warn!(raw = %raw, error = %e, "exec time not in broker format, keeping raw");
            raw.to_string()
        }
    }
}

pub fn security_info(fill: &Fill) -> String {
    let contract = &fill.contract;
    match SecType::from_code(&contract.sec_type) {
        SecType::Stock => STOCK_INFO.to_string(),
        SecType::Option | SecType::FutureOption => format!(
            "{} {} {}",
            expiry_token(&contract.last_trade_date_or_contract_month),
            contract.strike,
            Right::from_code(&contract.right).label()
        ),
        SecType::Other(code) => code,
    }
}

/// `20240315` -> `MAR'15'24`. Anything else is returned as-is.
pub fn expiry_token(raw: &str) -> String {
    let parsed = (|| {
        let digits = raw.get(..8).filter(|d| d.bytes().all(|b| b.is_ascii_digit()))?;
        let month: usize = digits[4..6].parse().ok()?;
        let day: u32 = digits[6..8].parse().ok()?;
        let name = MONTHS.get(month.checked_sub(1)?)?;
        Some(format!("{}'{:02}'{}", name, day, &digits[2..4]))
    })();

    parsed.unwrap_or_else(|| {
        warn!(expiry = %raw, "expiry not YYYYMMDD, keeping raw");
        raw.to_string()
    })
}

/// Realized PnL from the commission report; the sentinel and non-numbers become empty.
pub fn resolve_pnl(value: Option<&PnlValue>) -> Option<f64> {
    let x = match value? {
        PnlValue::Number(x) => *x,
        PnlValue::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    if is_not_applicable(x) {
        SENTINEL_PNL.inc();
        return None;
    }
    Some(x)
}

fn is_not_applicable(x: f64) -> bool {
    if !x.is_finite() {
        return true;
    }
    (x.abs() - PNL_NOT_APPLICABLE).abs() <= PNL_NOT_APPLICABLE * f64::EPSILON
}
