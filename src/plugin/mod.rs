use std::{fmt::Debug, sync::Arc};
use tracing::info;
use crate::{environment::{config::Settings, Environment}, errors::{Result, RuntimeError}};

pub mod loader;

pub use loader::{BuiltinLoader, EntryPoint, ModuleLoader};

const INIT_SYMBOL: &str = "init";
const START_SYMBOL: &str = "start";

#[derive(Clone)]
struct Entries {
    init: EntryPoint,
    start: EntryPoint,
}

/// A module loaded into the runtime at startup.
///
/// `init` runs once all plugins are loaded, `start` after every plugin has
/// been initialized.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    file: String,
    settings: Settings,
    entries: Option<Entries>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self::with_settings(name, file, Settings::new())
    }

    pub fn with_settings(name: impl Into<String>, file: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            settings,
            entries: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_loaded(&self) -> bool {
        self.entries.is_some()
    }

    /// Resolve the `init` and `start` entry points of the plugin library.
    pub fn load(&mut self, loader: &dyn ModuleLoader) -> Result<()> {
        let mut resolved = loader.load(&self.file, &[INIT_SYMBOL, START_SYMBOL])?.into_iter();
        let (Some(init), Some(start)) = (resolved.next(), resolved.next()) else {
            return Err(RuntimeError::LoadError(
                format!("{} did not export {} and {}", self.file, INIT_SYMBOL, START_SYMBOL)
            ));
        };
        self.entries = Some(Entries { init, start });
        info!(plugin = %self.name, file = %self.file, "plugin loaded");
        Ok(())
    }

    pub fn init(&self, env: &Arc<Environment>) -> Result<()> {
        match &self.entries {
            Some(entries) => (entries.init)(env, self),
            None => Ok(()),
        }
    }

    pub fn start(&self, env: &Arc<Environment>) -> Result<()> {
        match &self.entries {
            Some(entries) => (entries.start)(env, self),
            None => Ok(()),
        }
    }
}

impl Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("settings", &self.settings)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use parking_lot::Mutex;
    use crate::{environment::{config::Settings, Environment}, errors::RuntimeError};
    use super::{BuiltinLoader, Plugin};

    #[test]
    fn load_init_start() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let loader = BuiltinLoader::new();
        let c = calls.clone();
        loader.register("libbeacon.so", "init", move |_, plugin| {
            c.lock().push(format!("init {}", plugin.settings().string_value("call", "")));
            Ok(())
        }).unwrap();
        let c = calls.clone();
        loader.register("libbeacon.so", "start", move |env, plugin| {
            c.lock().push(format!("start {}", plugin.name()));
            assert!(env.services().is_empty());
            Ok(())
        }).unwrap();

        let env = Environment::new(Settings::new()).unwrap();
        let mut plugin = Plugin::with_settings(
            "beacon", "libbeacon.so", Settings::new().with("call", "N0CALL")
        );
        plugin.load(&loader).unwrap();
        assert!(plugin.is_loaded());

        plugin.init(&env).unwrap();
        plugin.start(&env).unwrap();
        assert_eq!(*calls.lock(), vec!["init N0CALL".to_string(), "start beacon".to_string()]);
    }

    #[test]
    fn unloaded_plugin_is_noop() {
        let env = Environment::new(Settings::new()).unwrap();
        let plugin = Plugin::new("idle", "libidle.so");
        assert!(!plugin.is_loaded());
        plugin.init(&env).unwrap();
        plugin.start(&env).unwrap();
    }

    #[test]
    fn missing_start_symbol() {
        let loader = BuiltinLoader::new();
        loader.register("libhalf.so", "init", |_, _| Ok(())).unwrap();

        let mut plugin = Plugin::new("half", "libhalf.so");
        let err = plugin.load(&loader).unwrap_err();
        assert!(matches!(err, RuntimeError::LoadError(_)));
        assert!(!plugin.is_loaded());
    }

    #[test]
    fn entry_error_propagates() {
        let loader = BuiltinLoader::new();
        loader.register("libbad.so", "init", |_, _| Err(RuntimeError::callback("no port"))).unwrap();
        loader.register("libbad.so", "start", |_, _| Ok(())).unwrap();

        let env = Environment::new(Settings::new()).unwrap();
        let mut plugin = Plugin::new("bad", "libbad.so");
        plugin.load(&loader).unwrap();
        assert_eq!(plugin.init(&env).unwrap_err(), RuntimeError::callback("no port"));
    }
}
