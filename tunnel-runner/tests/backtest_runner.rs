//! End-to-end runner tests: TOML config on disk, CSV bars, parallel run, artifacts.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use tunnel_core::domain::Direction;
use tunnel_runner::{
    load_artifacts, load_bars_csv, run_portfolio, save_artifacts, LoadError, RunConfig,
};

/// Hourly uptrend bars starting 2024-01-01 00:00 UTC, one per line.
fn uptrend_csv(n: usize) -> String {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    let mut prev = 1.1000;
    for i in 0..n {
        let close = 1.1000 + 0.0005 * i as f64;
        let ts = base + Duration::hours(i as i64);
        writeln!(
            out,
            "{},{:.5},{:.5},{:.5},{:.5},100",
            ts.format("%Y-%m-%d %H:%M:%S"),
            prev,
            close.max(prev) + 0.0002,
            close.min(prev) - 0.0003,
            close
        )
        .unwrap();
        prev = close;
    }
    out
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("run.toml");
    std::fs::write(&path, body).unwrap();
    path
}

const TWO_SYMBOLS: &str = r#"
[run]
name = "itest"

[[symbols]]
symbol = "EURUSD"
path = "eurusd.csv"

[[symbols]]
symbol = "GBPUSD"
path = "gbpusd.csv"
"#;

#[test]
fn loads_each_timestamp_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.csv");
    std::fs::write(
        &path,
        "timestamp,open,high,low,close,volume\n\
         2024-01-03,1.10,1.11,1.09,1.105,5\n\
         2024-01-01T00:00:00Z,1.10,1.11,1.09,1.105,5\n\
         2024-01-02 06:30:00,1.10,1.11,1.09,1.105,5\n",
    )
    .unwrap();

    let bars = load_bars_csv(&path, "EURUSD").unwrap();
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(bars[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 6, 30, 0).unwrap());
    assert_eq!(bars[2].timestamp, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_bars_csv(&dir.path().join("nope.csv"), "EURUSD"),
        Err(LoadError::Io { .. })
    ));
}

#[test]
fn from_file_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), TWO_SYMBOLS);
    let config = RunConfig::from_file(&path).unwrap();
    assert_eq!(config.symbols[0].path, dir.path().join("eurusd.csv"));
}

#[test]
fn unknown_strategy_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[strategy]
perod = 20

[[symbols]]
symbol = "EURUSD"
path = "eurusd.csv"
"#,
    );
    assert!(RunConfig::from_file(&path).is_err());
}

#[test]
fn short_and_missing_symbols_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("eurusd.csv"), uptrend_csv(80)).unwrap();
    // fewer bars than the tunnel warm-up
    std::fs::write(dir.path().join("gbpusd.csv"), uptrend_csv(10)).unwrap();
    let path = write_config(
        dir.path(),
        &format!(
            "{TWO_SYMBOLS}\n[[symbols]]\nsymbol = \"USDJPY\"\npath = \"usdjpy.csv\"\n"
        ),
    );
    let config = RunConfig::from_file(&path).unwrap();

    let result = run_portfolio(&config).unwrap();

    assert_eq!(result.reports.len(), 1);
    let eurusd = &result.reports["EURUSD"];
    assert!(eurusd.summary.total_trades >= 1);
    assert!(eurusd.ledger.iter().all(|t| t.direction == Direction::Long));
    assert_eq!(eurusd.summary.sell_signals, 0);

    let skipped: Vec<&str> = result.skipped.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.contains(&"GBPUSD"));
    assert!(skipped.contains(&"USDJPY"));
    assert_eq!(result.summary.symbols_skipped, 2);
    assert_eq!(result.summary.total_trades, eurusd.summary.total_trades);
    assert!(result.dataset_hashes.contains_key("EURUSD"));
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("eurusd.csv"), uptrend_csv(90)).unwrap();
    std::fs::write(dir.path().join("gbpusd.csv"), uptrend_csv(70)).unwrap();
    let config = RunConfig::from_file(&write_config(dir.path(), TWO_SYMBOLS)).unwrap();

    let a = run_portfolio(&config).unwrap();
    let b = run_portfolio(&config).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.reports.len(), 2);
}

#[test]
fn artifacts_are_written_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("eurusd.csv"), uptrend_csv(80)).unwrap();
    std::fs::write(dir.path().join("gbpusd.csv"), uptrend_csv(80)).unwrap();
    let config = RunConfig::from_file(&write_config(dir.path(), TWO_SYMBOLS)).unwrap();
    let result = run_portfolio(&config).unwrap();

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&result, out.path()).unwrap();

    assert!(run_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("itest_"));
    for file in [
        "summary.json",
        "report.md",
        "EURUSD_trades.csv",
        "EURUSD_equity.csv",
        "GBPUSD_trades.csv",
        "GBPUSD_equity.csv",
    ] {
        assert!(run_dir.join(file).is_file(), "missing {file}");
    }

    let trades = std::fs::read_to_string(run_dir.join("EURUSD_trades.csv")).unwrap();
    assert_eq!(
        trades.lines().count(),
        result.reports["EURUSD"].ledger.len() + 1
    );

    let reloaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(reloaded.run_id, result.run_id);
    assert_eq!(reloaded.reports.len(), 2);
}
