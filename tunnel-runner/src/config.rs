//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [run]
//! name = "majors"
//! output_dir = "results"
//!
//! [strategy]
//! period = 20
//! stop_loss_pips = 25.0
//!
//! [[symbols]]
//! symbol = "EURUSD"
//! path = "data/EURUSD_H1.csv"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tunnel_core::StrategyConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config lists no symbols")]
    NoSymbols,

    #[error("symbol '{0}' cannot be used in artifact file names")]
    InvalidSymbol(String),

    #[error("symbol '{0}' is listed more than once")]
    DuplicateSymbol(String),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] tunnel_core::ConfigError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,

    /// Strategy parameters; anything omitted takes its default.
    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub symbols: Vec<SymbolSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunSection {
    pub name: String,
    /// Root directory for artifacts.
    pub output_dir: PathBuf,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            name: "tunnel".into(),
            output_dir: PathBuf::from("results"),
        }
    }
}

/// One symbol and the CSV file holding its bars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolSource {
    pub symbol: String,
    pub path: PathBuf,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Relative symbol paths are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            for source in &mut config.symbols {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for source in &self.symbols {
            if !is_file_safe(&source.symbol) {
                return Err(ConfigError::InvalidSymbol(source.symbol.clone()));
            }
            if !seen.insert(source.symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(source.symbol.clone()));
            }
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Deterministic hash of the whole config.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Symbols name per-symbol artifact files, so they must be a single plain path component.
fn is_file_safe(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.contains(['/', '\\', ':'])
        && !symbol.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[run]
name = "majors"
output_dir = "out"

[strategy]
period = 14
stop_loss_pips = 25.0
fallback_order = "stop"

[[symbols]]
symbol = "EURUSD"
path = "data/eurusd.csv"

[[symbols]]
symbol = "GBPUSD"
path = "data/gbpusd.csv"
"#;

    #[test]
    fn parses_sample() {
        let config = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.run.name, "majors");
        assert_eq!(config.strategy.period, 14);
        assert_eq!(config.strategy.wavy_period, 12);
        assert_eq!(config.strategy.fallback_order, tunnel_core::FallbackOrder::Stop);
        assert_eq!(config.symbols.len(), 2);
    }

    #[test]
    fn strategy_section_optional() {
        let config = RunConfig::from_toml(
            r#"
[[symbols]]
symbol = "EURUSD"
path = "a.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyConfig::default());
        assert_eq!(config.run, RunSection::default());
    }

    #[test]
    fn empty_symbols_rejected() {
        assert!(matches!(
            RunConfig::from_toml("[run]\nname = \"x\"\n"),
            Err(ConfigError::NoSymbols)
        ));
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let toml = r#"
[[symbols]]
symbol = "EURUSD"
path = "a.csv"

[[symbols]]
symbol = "EURUSD"
path = "b.csv"
"#;
        assert!(matches!(
            RunConfig::from_toml(toml),
            Err(ConfigError::DuplicateSymbol(s)) if s == "EURUSD"
        ));
    }

    #[test]
    fn path_like_symbols_rejected() {
        for bad in ["BTC/USD", "EUR\\USD", "..", ""] {
            let toml = format!("[[symbols]]\nsymbol = '{bad}'\npath = 'a.csv'\n");
            assert!(
                matches!(RunConfig::from_toml(&toml), Err(ConfigError::InvalidSymbol(_))),
                "{bad:?} accepted"
            );
        }
        let ok = "[[symbols]]\nsymbol = \"BTC-USD\"\npath = \"a.csv\"\n";
        RunConfig::from_toml(ok).unwrap();
    }

    #[test]
    fn invalid_strategy_rejected() {
        let toml = r#"
[strategy]
period = 0

[[symbols]]
symbol = "EURUSD"
path = "a.csv"
"#;
        assert!(matches!(
            RunConfig::from_toml(toml),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::from_toml(SAMPLE).unwrap();
        let b = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        let mut c = a.clone();
        c.strategy.period = 15;
        assert_ne!(a.run_id().unwrap(), c.run_id().unwrap());
    }
}
