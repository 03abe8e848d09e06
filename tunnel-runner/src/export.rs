//! Reporting and export: JSON, CSV and Markdown artifacts.
//!
//! Persisted JSON carries `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tunnel_core::domain::TradeLedgerEntry;
use tunnel_core::{BacktestReport, EquityPoint};

use crate::runner::{PortfolioResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &PortfolioResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize PortfolioResult to JSON")
}

/// Deserialize a `PortfolioResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<PortfolioResult> {
    let result: PortfolioResult =
        serde_json::from_str(json).context("failed to deserialize PortfolioResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade ledger as CSV.
///
/// Columns: symbol, direction, entry_time, entry_price, exit_time,
/// exit_price, size, profit, exit_reason
pub fn export_ledger_csv(ledger: &[TradeLedgerEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "direction",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "size",
        "profit",
        "exit_reason",
    ])?;

    for t in ledger {
        wtr.write_record([
            &t.symbol,
            &format!("{:?}", t.direction).to_uppercase(),
            &t.entry_time.to_rfc3339(),
            &format!("{:.5}", t.entry_price),
            &t.exit_time.to_rfc3339(),
            &format!("{:.5}", t.exit_price),
            &format!("{:.2}", t.size),
            &format!("{:.2}", t.profit),
            &t.exit_reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for point in equity_curve {
        wtr.write_record([
            &point.timestamp.to_rfc3339(),
            &format!("{:.2}", point.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run: `{name}_{first 12 chars of run_id}`.
pub fn artifact_dir_name(result: &PortfolioResult) -> String {
    let prefix: String = result.run_id.chars().take(12).collect();
    format!("{}_{}", result.name, prefix)
}

/// Save the full artifact set for a portfolio run.
///
/// Creates `{name}_{run_id prefix}/` under `output_dir` containing:
/// - `summary.json`: the full `PortfolioResult`
/// - `{symbol}_trades.csv` and `{symbol}_equity.csv` per symbol
/// - `report.md`
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &PortfolioResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    write(&run_dir.join("summary.json"), &json)?;

    for (symbol, report) in &result.reports {
        let trades = export_ledger_csv(&report.ledger)?;
        write(&run_dir.join(format!("{symbol}_trades.csv")), &trades)?;

        let equity = export_equity_csv(&report.equity_curve)?;
        write(&run_dir.join(format!("{symbol}_equity.csv")), &equity)?;
    }

    write(&run_dir.join("report.md"), &generate_report(result))?;

    Ok(run_dir)
}

/// Load a `PortfolioResult` from an artifact directory's summary.json.
pub fn load_artifacts(dir: &Path) -> Result<PortfolioResult> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a portfolio run.
pub fn generate_report(result: &PortfolioResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Tunnel Backtest: {}\n\n", result.name));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Schema | v{} |\n", result.schema_version));
    let s = &result.config.strategy;
    md.push_str(&format!(
        "| Tunnel | period {} x{:.2}, wavy {} |\n",
        s.period, s.deviation_factor, s.wavy_period
    ));
    md.push_str(&format!(
        "| Risk | {:.2}% per trade, SL {} / TP {} pips |\n",
        s.risk_per_trade * 100.0,
        s.stop_loss_pips,
        s.take_profit_pips
    ));
    md.push_str(&format!(
        "| Daily limits | {} trades, {:.2} loss |\n",
        s.max_trades_per_day, s.max_loss_per_day
    ));
    md.push('\n');

    let p = &result.summary;
    md.push_str("## Portfolio\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbols | {} run, {} skipped |\n", p.symbols_run, p.symbols_skipped));
    md.push_str(&format!("| Trades | {} |\n", p.total_trades));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", p.win_rate() * 100.0));
    md.push_str(&format!("| Net Profit | {:.2} |\n", p.net_profit));
    md.push_str(&format!("| Forced Closes | {} |\n", p.forced_closes));
    md.push_str(&format!("| Halted Days | {} |\n", p.halted_days));
    md.push('\n');

    if !result.reports.is_empty() {
        md.push_str("## Symbols\n\n");
        md.push_str("| Symbol | Trades | Win Rate | Net Profit | Ending Equity | Halted Days |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- |\n");
        for report in result.reports.values() {
            md.push_str(&symbol_row(report));
        }
        md.push('\n');
    }

    if !result.skipped.is_empty() {
        md.push_str("## Skipped\n\n");
        for skip in &result.skipped {
            md.push_str(&format!("- **{}**: {}\n", skip.symbol, skip.reason));
        }
        md.push('\n');
    }

    md
}

fn symbol_row(report: &BacktestReport) -> String {
    let s = &report.summary;
    format!(
        "| {} | {} | {:.1}% | {:.2} | {:.2} | {} |\n",
        report.symbol,
        s.total_trades,
        s.win_rate() * 100.0,
        s.net_profit,
        s.ending_equity,
        s.halted_days
    )
}
