use std::sync::Arc;
use tracing::info;
use crate::{directory::ServiceDirectory, errors::Result, timer::TimerManager};
use config::Settings;
use logger::LogLevel;

pub mod config;
pub mod logger;

/// Services shared by every module of one runtime instance.
///
/// Built once at startup and handed to plugins and sessions as
/// `Arc<Environment>`. Separate instances are fully isolated, which is what
/// the tests rely on.
pub struct Environment {
    settings: Settings,
    log_level: LogLevel,
    timers: TimerManager,
    services: ServiceDirectory,
}

impl Environment {
    /// Decode `loglevel` and `tick` and build the shared services.
    /// The timer thread is not started yet, see [`Environment::start`].
    pub fn new(settings: Settings) -> Result<Arc<Self>> {
        let log_level = match settings.get("loglevel") {
            Some(raw) => raw.parse()?,
            None => LogLevel::from_env(),
        };
        let timers = TimerManager::from_settings(&settings)?;

        Ok(Arc::new(Self {
            settings,
            log_level,
            timers,
            services: ServiceDirectory::new(),
        }))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    pub fn services(&self) -> &ServiceDirectory {
        &self.services
    }

    /// Install logging at the configured level and start the timer thread.
    pub fn start(&self) -> Result<()> {
        logger::init(self.log_level);
        info!(level = %self.log_level, "set log level");
        self.timers.start()
    }

    /// Stop the timer thread and unpublish every service.
    pub fn shutdown(&self) {
        info!("runtime shutting down");
        self.timers.terminate();
        self.services.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use crate::errors::RuntimeError;
    use super::{config::Settings, logger::LogLevel, Environment};

    #[test]
    fn decodes_settings() {
        let env = Environment::new(
            Settings::new().with("loglevel", "INFO").with("tick", "20")
        ).unwrap();
        assert_eq!(env.log_level(), LogLevel::Info);
        assert_eq!(env.timers().tick(), Duration::from_millis(20));
        assert!(env.services().is_empty());
        assert!(!env.timers().is_running());
    }

    #[test]
    fn rejects_bad_settings() {
        let res = Environment::new(Settings::new().with("loglevel", "LOUD"));
        assert!(matches!(res, Err(RuntimeError::InvalidConfig(_))));

        let res = Environment::new(Settings::new().with("tick", "soon"));
        assert!(matches!(res, Err(RuntimeError::InvalidConfig(_))));
    }

    #[test]
    fn start_and_shutdown() {
        let env = Environment::new(Settings::new().with("tick", "5")).unwrap();
        env.start().unwrap();
        assert!(env.timers().is_running());
        env.shutdown();
        assert!(!env.timers().is_running());
    }
}
