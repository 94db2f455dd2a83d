// ===============================
// src/domain.rs
// ===============================
use ahash::AHashMap;
use serde::{Deserialize, Serialize, Serializer};

// ---- Raw feed (format callback TWS: execDetails / commissionReport) ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side { Bought, Sold }
impl Side {
    /// Apa pun selain "BOT" dianggap jual.
    pub fn from_code(code: &str) -> Self { if code == "BOT" { Side::Bought } else { Side::Sold } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecType { Stock, Option, FutureOption, Other(String) }
impl SecType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "STK" => SecType::Stock,
            "OPT" => SecType::Option,
            "FOP" => SecType::FutureOption,
            other => SecType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Right { Call, Put }
impl Right {
    pub fn from_code(code: &str) -> Self { if code == "C" { Right::Call } else { Right::Put } }
    pub fn label(&self) -> &'static str { match self { Right::Call => "CALL", Right::Put => "PUT" } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub symbol: String,
    pub sec_type: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub last_trade_date_or_contract_month: String, // YYYYMMDD untuk OPT/FOP
    #[serde(default)]
    pub strike: f64,
    #[serde(default)]
    pub right: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub exec_id: String,
    #[serde(default)]
    pub acct_number: String,
    #[serde(default)]
    pub side: String, // kosong -> SLD
    #[serde(default)]
    pub time: String, // "YYYYMMDD  HH:MM:SS" (waktu lokal broker)
    #[serde(default)]
    pub shares: f64,
    pub price: f64,
    #[serde(default)]
    pub order_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill { pub contract: Contract, pub execution: Execution }

/// Realized PnL bisa datang sebagai angka, string, atau null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PnlValue { Number(f64), Text(String) }

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReport {
    pub exec_id: String,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(rename = "realizedPNL", default)]
    pub realized_pnl: Option<PnlValue>,
}

pub type CommissionMap = AHashMap<String, CommissionReport>;

/// One terminal session worth of data: fills in arrival order + commissions by exec id.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch { pub label: String, pub fills: Vec<Fill>, pub commissions: CommissionMap }

// ---- Ledger ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "BOT")] Bot,
    #[serde(rename = "SLD")] Sld,
    #[serde(rename = "ASSIGNED")] Assigned,
    #[serde(rename = "EXPIRED")] Expired,
}
impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Bot => "BOT",
            Action::Sld => "SLD",
            Action::Assigned => "ASSIGNED",
            Action::Expired => "EXPIRED",
        }
    }
}
impl From<Side> for Action {
    fn from(side: Side) -> Self { match side { Side::Bought => Action::Bot, Side::Sold => Action::Sld } }
}

pub const STOCK_INFO: &str = "STOCK";

/// Normalized ledger row. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "Date_Time")]
    pub date_time: String,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Security_Info")]
    pub security_info: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Commission")]
    pub commission: f64,
    #[serde(rename = "Unrealized_PnL", serialize_with = "number_or_empty")]
    pub unrealized_pnl: Option<f64>,
    #[serde(rename = "Realized_PnL", serialize_with = "number_or_empty")]
    pub realized_pnl: Option<f64>,
    #[serde(rename = "Exchange")]
    pub exchange: String,
}

impl TradeRecord {
    pub fn is_stock(&self) -> bool { self.security_info == STOCK_INFO }
}

// Sel kosong ditulis "" (konvensi spreadsheet), bukan null
fn number_or_empty<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(x) => s.serialize_f64(*x),
        None => s.serialize_str(""),
    }
}
