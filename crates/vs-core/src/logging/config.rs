//! Logging configuration.
//!
//! Supports configuration via:
//! - Environment variables (VOTESCOPE_LOG, RUST_LOG, VOTESCOPE_LOG_FORMAT)
//! - CLI flags (-v/-vv, -q)

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    #[value(alias = "json")]
    Jsonl,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    /// Completely silent.
    Off,
}

impl LogLevel {
    /// Level selected by `-v` repetitions, or `Warn` when `-q` is given.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Option<Self> {
        if quiet {
            return Some(LogLevel::Warn);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    /// Most verbose level named anywhere in a `RUST_LOG` directive string.
    fn from_directives(directives: &str) -> Option<Self> {
        [LogLevel::Trace, LogLevel::Debug, LogLevel::Warn, LogLevel::Error]
            .into_iter()
            .find(|level| {
                level
                    .to_possible_value()
                    .is_some_and(|v| directives.contains(v.get_name()))
            })
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Minimum log level.
    pub level: LogLevel,
    /// Whether ANSI colors are allowed on stderr.
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            color: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Same as [`LogConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(
        lookup: F,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        // VOTESCOPE_LOG takes precedence over RUST_LOG
        let env_level = match lookup("VOTESCOPE_LOG") {
            Some(val) => LogLevel::from_str(&val, true).ok(),
            None => lookup("RUST_LOG").and_then(|val| LogLevel::from_directives(&val)),
        };
        if let Some(level) = env_level {
            config.level = level;
        }

        if let Some(format) = lookup("VOTESCOPE_LOG_FORMAT")
            .and_then(|val| LogFormat::from_str(&val, true).ok())
        {
            config.format = format;
        }

        config.level = cli_level.unwrap_or(config.level);
        config.format = cli_format.unwrap_or(config.format);
        config
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }
}
