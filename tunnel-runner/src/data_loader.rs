//! Bar loading from CSV files.
//!
//! Expected header: `timestamp,open,high,low,close,volume` (volume optional).
//! Timestamps may be RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare
//! `YYYY-MM-DD` (midnight UTC). Rows are sorted by timestamp; duplicate
//! timestamps and inconsistent OHLC rows are rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tunnel_core::domain::{validate_sequence, BarError, PriceBar};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in '{origin}': {source}")]
    Csv { origin: String, source: csv::Error },

    #[error("'{origin}' line {line}: unrecognised timestamp '{value}'")]
    BadTimestamp {
        origin: String,
        line: usize,
        value: String,
    },

    #[error("'{origin}' contains no bars")]
    Empty { origin: String },

    #[error("{symbol}: duplicate bar at {timestamp}")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: DateTime<Utc>,
    },

    #[error("{symbol}: {source}")]
    InvalidBars { symbol: String, source: BarError },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse the timestamp formats accepted in bar files.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Load one symbol's bars from a CSV file.
pub fn load_bars_csv(path: &Path, symbol: &str) -> Result<Vec<PriceBar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bars_csv(file, symbol, &path.display().to_string())
}

/// Parse bars from any CSV source. `origin` names the source in errors.
pub fn parse_bars_csv<R: Read>(
    reader: R,
    symbol: &str,
    origin: &str,
) -> Result<Vec<PriceBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|source| LoadError::Csv {
            origin: origin.to_string(),
            source,
        })?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            origin: origin.to_string(),
            // header is line 1
            line: i + 2,
            value: row.timestamp.clone(),
        })?;
        bars.push(PriceBar::new(
            timestamp,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume.unwrap_or(0.0),
        ));
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            origin: origin.to_string(),
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(LoadError::DuplicateTimestamp {
            symbol: symbol.to_string(),
            timestamp: pair[1].timestamp,
        });
    }
    validate_sequence(&bars).map_err(|source| LoadError::InvalidBars {
        symbol: symbol.to_string(),
        source,
    })?;

    Ok(bars)
}

/// BLAKE3 over the raw bar values, for provenance in run artifacts.
pub fn dataset_hash(bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
