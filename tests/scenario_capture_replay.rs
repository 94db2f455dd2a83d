use ib_trade_ledger::config::EngineCfg;
use ib_trade_ledger::{feed, pipeline, recorder};

const CAPTURE: &str = r#"
# acct U777, one vertical call spread + one worthless put
{"ExecDetails":{"contract":{"symbol":"XYZ","secType":"OPT","currency":"USD","exchange":"CBOE","lastTradeDateOrContractMonth":"20240315","strike":100.0,"right":"C"},"execution":{"execId":"e1","acctNumber":"U777","side":"SLD","time":"20240301  15:30:00","shares":1,"price":-1.5}}}
{"ExecDetails":{"contract":{"symbol":"XYZ","secType":"OPT","currency":"USD","exchange":"CBOE","lastTradeDateOrContractMonth":"20240315","strike":105.0,"right":"C"},"execution":{"execId":"e2","acctNumber":"U777","side":"BOT","time":"20240301  15:30:00","shares":1,"price":2.0}}}
{"ExecDetails":{"contract":{"symbol":"XYZ","secType":"OPT","currency":"USD","exchange":"SMART","lastTradeDateOrContractMonth":"20240315","strike":100.0,"right":"C"},"execution":{"execId":"e3","acctNumber":"U777","side":"SLD","time":"20240301  15:30:00","shares":1,"price":0.5,"orderRef":"OptTrader#12"}}}
{"ExecDetails":{"contract":{"symbol":"ABC","secType":"OPT","currency":"USD","exchange":"SMART","lastTradeDateOrContractMonth":"20240315","strike":40.0,"right":"P"},"execution":{"execId":"p1","acctNumber":"U777","side":"SLD","time":"20240315  16:20:00","shares":2,"price":0.0}}}
this line is garbage
"ExecDetailsEnd"
{"CommissionReport":{"execId":"e1","commission":0.65,"currency":"USD","realizedPNL":50.0}}
{"CommissionReport":{"execId":"e2","commission":0.65,"currency":"USD","realizedPNL":"-20"}}
{"CommissionReport":{"execId":"e3","commission":0.0,"currency":"USD","realizedPNL":1.7976931348623157e308}}
"#;

#[tokio::test]
async fn scenario_capture_to_ledger_file() {
    let dir = std::env::temp_dir().join(format!("ib_trade_ledger_replay_{}", std::process::id()));
    let _ = tokio::fs::remove_dir_all(&dir).await;
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let capture = dir.join("U777.jsonl").to_string_lossy().into_owned();
    let output = dir.join("out").join("trade_data.jsonl").to_string_lossy().into_owned();
    tokio::fs::write(&capture, CAPTURE).await.unwrap();

    let batch = feed::load_batch(&capture).await.unwrap();
    assert_eq!(batch.label, "U777");
    assert_eq!(batch.fills.len(), 4);
    assert_eq!(batch.commissions.len(), 3);

    let ledger = pipeline::run(&[batch], &EngineCfg::default());
    assert_eq!(ledger.len(), 2);
    assert_eq!(recorder::append_ledger(&output, &ledger).await.unwrap(), 2);

    let text = tokio::fs::read_to_string(&output).await.unwrap();
    let rows: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 2);

    let combo = &rows[0];
    assert_eq!(combo["Security_Info"], "MAR'15'24 105/100");
    assert_eq!(combo["Realized_PnL"], 30.0);
    assert_eq!(combo["Unrealized_PnL"], 50.0);
    assert_eq!(combo["Action"], "SLD");

    let put = &rows[1];
    assert_eq!(put["Action"], "EXPIRED");
    assert_eq!(put["Security_Info"], "MAR'15'24 40 PUT");
    assert_eq!(put["Realized_PnL"], "");
    assert_eq!(put["Date_Time"], "15.03.2024 16:20:00");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn scenario_missing_capture_is_an_error() {
    let missing = std::env::temp_dir().join("ib_trade_ledger_does_not_exist.jsonl");
    let result = feed::load_batch(&missing.to_string_lossy()).await;
    assert!(result.is_err());
}
