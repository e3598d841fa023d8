use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, info};
use crate::{channel::ChannelProxy, errors::{Result, RuntimeError}};

/// Registry of published server channels.
///
/// Long lived server sessions publish the proxy of their listening channel
/// under a name; clients look the name up and `connect` to it. A published
/// proxy keeps its session alive until it is removed.
#[derive(Default)]
pub struct ServiceDirectory {
    proxies: DashMap<String, ChannelProxy>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, proxy: ChannelProxy) -> Result<()> {
        let name = name.into();
        match self.proxies.entry(name) {
            Entry::Occupied(entry) => Err(RuntimeError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!(service = %entry.key(), session = %proxy.id(), "publish service");
                entry.insert(proxy);
                Ok(())
            },
        }
    }

    /// Proxy published under `name`, or an empty proxy.
    pub fn find(&self, name: &str) -> ChannelProxy {
        self.proxies
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Look up the server a client endpoint points to.
    pub fn resolve(&self, endpoint: &EndPoint) -> Result<ChannelProxy> {
        let proxy = self.find(endpoint.url());
        if !proxy.is_valid() {
            debug!(endpoint = %endpoint.name(), url = %endpoint.url(), "no live service");
            return Err(RuntimeError::ConnectionClosed);
        }
        Ok(proxy)
    }

    pub fn remove(&self, name: &str) -> Option<ChannelProxy> {
        // The shard lock is released before the proxy is handed back, so
        // dropping it may safely destroy the session.
        self.proxies.remove(name).map(|(_, proxy)| proxy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.proxies.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.proxies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Drop every published proxy.
    pub fn clear(&self) {
        for name in self.names() {
            drop(self.remove(&name));
        }
    }
}

/// Client endpoint descriptor. It can be connected to the server published
/// under a name equal to its URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndPoint {
    name: String,
    url: String,
}

impl EndPoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
