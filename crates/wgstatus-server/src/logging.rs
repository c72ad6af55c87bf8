//! Structured logging configuration

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter: our own events at info, per-request tracing kept quiet
const DEFAULT_DIRECTIVES: &str = "info,tower_http=warn";

/// Verbose filter: snapshot timings and every HTTP request
const VERBOSE_DIRECTIVES: &str = "debug,tower_http=debug";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub directives: String,
    /// Output format
    pub format: LogFormat,
    /// Include file/line info
    pub file_info: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line colored output for a terminal
    Pretty,
    /// Single-line output for journald and log files
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!(
                "unknown log format '{}' (expected pretty or compact)",
                other
            )),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(false, None)
    }
}

impl LogConfig {
    /// Config from command line flags.
    ///
    /// Verbose runs default to pretty output with source locations; an
    /// explicit `format` always wins.
    pub fn new(verbose: bool, format: Option<LogFormat>) -> Self {
        let default_format = if verbose {
            LogFormat::Pretty
        } else {
            LogFormat::Compact
        };
        Self {
            directives: if verbose {
                VERBOSE_DIRECTIVES
            } else {
                DEFAULT_DIRECTIVES
            }
            .to_string(),
            format: format.unwrap_or(default_format),
            file_info: verbose,
        }
    }
}

/// Initialize logging with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.directives`.
pub fn init_logging(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.directives));

    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(config.file_info)
                .with_line_number(config.file_info);

            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_file(config.file_info)
                .with_line_number(config.file_info);

            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
    }

    tracing::debug!(
        directives = %config.directives,
        format = ?config.format,
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("json".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_quiet_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.directives, DEFAULT_DIRECTIVES);
        assert!(!config.file_info);
    }

    #[test]
    fn test_verbose_defaults_to_pretty() {
        let config = LogConfig::new(true, None);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.directives.starts_with("debug"));
        assert!(config.file_info);
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = LogConfig::new(true, Some(LogFormat::Compact));
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
        assert!(EnvFilter::try_new(VERBOSE_DIRECTIVES).is_ok());
    }
}
