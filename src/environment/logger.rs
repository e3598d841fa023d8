use std::{fmt::Display, str::FromStr};
use tracing::level_filters::LevelFilter;
use crate::errors::RuntimeError;

pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Verbosity names accepted by the `loglevel` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    None,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Level named by the `LOG_LEVEL` environment variable. Unset or
    /// unknown values fall back to `None`.
    pub fn from_env() -> Self {
        match std::env::var(LOG_LEVEL_VAR) {
            Ok(raw) => raw.parse().unwrap_or_default(),
            Err(_) => Self::None,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            Self::None => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warning => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

impl FromStr for LogLevel {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NONE" => Ok(Self::None),
            "ERROR" => Ok(Self::Error),
            "WARN" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            other => Err(RuntimeError::InvalidConfig(format!("log level \"{}\"", other))),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bstr = match self {
            Self::None => "NONE",
            Self::Error => "ERROR",
            Self::Warning => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        };
        f.write_str(bstr)
    }
}

/// Install the global fmt subscriber capped at `level`.
/// Returns false when a subscriber was already installed.
pub fn init(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level.filter())
        .with_thread_names(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;
    use crate::errors::RuntimeError;
    use super::LogLevel;

    #[test]
    fn decode_names() {
        assert_eq!("NONE".parse::<LogLevel>().unwrap(), LogLevel::None);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!(matches!("WARNING".parse::<LogLevel>(), Err(RuntimeError::InvalidConfig(_))));
        assert!(matches!("debug".parse::<LogLevel>(), Err(RuntimeError::InvalidConfig(_))));
    }

    #[test]
    fn none_turns_logging_off() {
        assert_eq!(LogLevel::None.filter(), LevelFilter::OFF);
        assert_eq!(LogLevel::Info.filter(), LevelFilter::INFO);
        assert!(LogLevel::Debug > LogLevel::Error);
    }
}
