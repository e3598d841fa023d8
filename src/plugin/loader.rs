use std::{collections::HashMap, sync::Arc};
use dashmap::DashMap;
use tracing::debug;
use crate::{environment::Environment, errors::{Result, RuntimeError}};
use super::Plugin;

/// Entry point exported by a module. The host calls it with the shared
/// environment and the plugin's own description.
pub type EntryPoint = Arc<dyn Fn(&Arc<Environment>, &Plugin) -> Result<()> + Send + Sync>;

/// Resolve a library path to named entry points.
pub trait ModuleLoader: Send + Sync {
    /// The returned vector matches `symbols` in size and order. A missing
    /// library or an unresolved symbol fails with `LoadError`.
    fn load(&self, path: &str, symbols: &[&str]) -> Result<Vec<EntryPoint>>;
}

/// Loader for modules linked into the host binary.
///
/// Each library path maps to a table of exported symbols, registered at
/// startup before any plugin is loaded.
#[derive(Default)]
pub struct BuiltinLoader {
    libraries: DashMap<String, HashMap<String, EntryPoint>>,
}

impl BuiltinLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `symbol` from the library at `path`.
    pub fn register<F>(&self, path: impl Into<String>, symbol: impl Into<String>, entry: F) -> Result<()>
    where F: Fn(&Arc<Environment>, &Plugin) -> Result<()> + Send + Sync + 'static
    {
        let path = path.into();
        let symbol = symbol.into();
        let mut library = self.libraries.entry(path.clone()).or_default();
        if library.contains_key(&symbol) {
            return Err(RuntimeError::DuplicateKey(format!("{}:{}", path, symbol)));
        }
        library.insert(symbol, Arc::new(entry));
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.libraries.contains_key(path)
    }
}

impl ModuleLoader for BuiltinLoader {
    fn load(&self, path: &str, symbols: &[&str]) -> Result<Vec<EntryPoint>> {
        let library = self.libraries
            .get(path)
            .ok_or_else(|| RuntimeError::LoadError(format!("unable to load {}", path)))?;

        symbols.iter()
            .map(|symbol| {
                debug!(library = %path, symbol = %symbol, "link symbol");
                library.get(*symbol).cloned().ok_or_else(|| {
                    RuntimeError::LoadError(format!("unable to link \"{}\" from {}", symbol, path))
                })
            })
            .collect()
    }
}
