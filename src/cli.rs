use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "vaultwatch",
    version,
    about = "Identity exposure scanner over vaulted personal identifiers",
    long_about = "vaultwatch replays captured evidence against a profile's vaulted identifiers, \
validates candidate matches, and reports persisted findings with an aggregate risk score."
)]
pub struct Cli {
    /// Vault file mapping profiles to monitored identifiers (JSON)
    #[arg(long)]
    pub vault: PathBuf,

    /// Evidence capture file replayed as the lookup backend (JSON)
    #[arg(long)]
    pub evidence: PathBuf,

    /// Profile to scan
    #[arg(short, long)]
    pub profile: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine config file (.yaml, .yml, or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-identifier lookup timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum concurrent evidence lookups
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Confidence floor for accepting scored candidates (0-100)
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Strict mode: any persisted finding fails the run
    #[arg(short, long)]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the engine configuration: config file first, then flag
    /// overrides, then a final validation pass.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::load(Some(Path::new("."))),
        };
        if let Some(secs) = self.timeout_secs {
            config.lookup_timeout_secs = secs;
        }
        if let Some(max) = self.max_concurrency {
            config.max_concurrent_lookups = max;
        }
        if let Some(min) = self.min_confidence {
            config.min_confidence = min;
        }
        if self.strict {
            config.strict = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const BASE: [&str; 7] = [
        "vaultwatch",
        "--vault",
        "vault.json",
        "--evidence",
        "capture.json",
        "--profile",
        "p1",
    ];

    fn with_args(extra: &[&str]) -> Vec<String> {
        BASE.iter().chain(extra).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cli_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_basic_args() {
        let cli = Cli::try_parse_from(BASE).unwrap();
        assert_eq!(cli.profile, "p1");
        assert!(!cli.strict);
        assert!(!cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Terminal));
    }

    #[test]
    fn test_missing_vault_is_error() {
        let result = Cli::try_parse_from(["vaultwatch", "--profile", "p1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_format_json() {
        let cli = Cli::try_parse_from(with_args(&["--format", "json"])).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn test_parse_strict_and_verbose() {
        let cli = Cli::try_parse_from(with_args(&["--strict", "-v"])).unwrap();
        assert!(cli.strict);
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_tuning_flags() {
        let cli = Cli::try_parse_from(with_args(&[
            "--timeout-secs",
            "3",
            "--max-concurrency",
            "8",
            "--min-confidence",
            "90",
        ]))
        .unwrap();
        assert_eq!(cli.timeout_secs, Some(3));
        assert_eq!(cli.max_concurrency, Some(8));
        assert_eq!(cli.min_confidence, Some(90.0));
    }

    #[test]
    fn test_engine_config_applies_overrides() {
        let cli = Cli::try_parse_from(with_args(&["--timeout-secs", "3", "--strict"])).unwrap();
        let config = cli.engine_config().unwrap();
        assert_eq!(config.lookup_timeout_secs, 3);
        assert!(config.strict);
        assert_eq!(config.max_concurrent_lookups, 4);
    }

    #[test]
    fn test_engine_config_rejects_zero_timeout() {
        let cli = Cli::try_parse_from(with_args(&["--timeout-secs", "0"])).unwrap();
        assert!(cli.engine_config().is_err());
    }
}
