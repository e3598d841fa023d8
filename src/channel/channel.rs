use std::{mem, sync::{atomic::{AtomicBool, Ordering}, Arc, Weak}};
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use crate::{errors::{Capability, Result, RuntimeError}, session::Session};
use super::{handler::ChannelHandler, ChannelProxy, Params, Priority};

/// Part of a channel reachable through proxies.
///
/// Proxies only hold a weak reference to it; `alive` turns false on
/// [`Channel::reset`] so every outstanding proxy degrades to closed.
pub(crate) struct ChannelCore {
    session: RwLock<Option<Weak<dyn Session>>>,
    handler: RwLock<Option<Arc<dyn ChannelHandler>>>,
    alive: AtomicBool,
}

impl ChannelCore {
    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn session(&self) -> Option<Arc<dyn Session>> {
        self.session.read().as_ref().and_then(Weak::upgrade)
    }

    // Handler is cloned out so no lock is held while it runs.
    fn handler(&self) -> Option<Arc<dyn ChannelHandler>> {
        self.handler.read().clone()
    }

    pub(crate) fn on_connect(&self, backlink: ChannelProxy, params: Params) -> Result<ChannelProxy> {
        let handler = self.handler()
            .ok_or(RuntimeError::CapabilityNotSupported(Capability::Connect))?;
        handler.on_connect(backlink, params)
    }

    pub(crate) fn on_open(&self, params: Params) -> Result<()> {
        let handler = self.handler()
            .ok_or(RuntimeError::CapabilityNotSupported(Capability::Open))?;
        handler.on_open(params)
    }

    pub(crate) fn on_close(&self, params: Params) -> Result<()> {
        let handler = self.handler()
            .ok_or(RuntimeError::CapabilityNotSupported(Capability::Close))?;
        handler.on_close(params)
    }

    pub(crate) fn on_receive(&self, message: Params, priority: Priority) -> Result<()> {
        let handler = self.handler()
            .ok_or(RuntimeError::CapabilityNotSupported(Capability::Receive))?;
        handler.on_receive(message, priority)
    }

    pub(crate) fn on_ctrl(&self, request: Params) -> Result<Params> {
        let handler = self.handler()
            .ok_or(RuntimeError::CapabilityNotSupported(Capability::Control))?;
        handler.on_ctrl(request)
    }
}

/// A session's endpoint. Forwards to at most one connected peer.
///
/// Channels are members of the session that owns them. Calls are plain
/// synchronous calls; the internal locks are never held while a peer or a
/// handler runs, so handlers may freely call back into either channel.
pub struct Channel {
    core: Arc<ChannelCore>,
    remote: Mutex<ChannelProxy>,
}

impl Channel {
    /// Bind a new channel to its owning session. Usually called from inside
    /// the builder passed to [`crate::session::spawn`].
    pub fn new<S: Session>(session: &Weak<S>) -> Self {
        let session: Weak<dyn Session> = session.clone();
        let core = ChannelCore {
            session: RwLock::new(Some(session)),
            handler: RwLock::new(None),
            alive: AtomicBool::new(true),
        };
        Self {
            core: Arc::new(core),
            remote: Mutex::new(ChannelProxy::default()),
        }
    }

    /// Install the inbound handler, replacing any previous one.
    pub fn set_handler(&self, handler: Arc<dyn ChannelHandler>) {
        let old = self.core.handler.write().replace(handler);
        drop(old);
    }

    pub fn set_callbacks(&self, callbacks: super::Callbacks) {
        self.set_handler(Arc::new(callbacks))
    }

    pub fn local_proxy(&self) -> ChannelProxy {
        ChannelProxy::bind(&self.core)
    }

    pub fn remote_proxy(&self) -> ChannelProxy {
        self.remote.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        !self.remote.lock().is_empty()
    }

    /// False once the channel has been reset.
    pub fn is_alive(&self) -> bool {
        self.core.is_alive()
    }

    pub(crate) fn set_remote(&self, proxy: ChannelProxy) {
        let old = mem::replace(&mut *self.remote.lock(), proxy);
        drop(old);
    }

    // Remote link for an outbound call, cloned so the peer session stays
    // alive for the whole call even if the link is cleared meanwhile.
    fn linked_remote(&self) -> Result<ChannelProxy> {
        let remote = self.remote.lock().clone();
        if remote.is_empty() {
            return Err(RuntimeError::not_connected());
        }
        Ok(remote)
    }

    pub fn connect(&self, target: &ChannelProxy, params: Params) -> Result<()> {
        if !self.is_alive() {
            return Err(RuntimeError::ConnectionClosed);
        }
        if self.is_connected() {
            return Err(RuntimeError::already_connected());
        }

        let peer = target.connect(self.local_proxy(), params)?;
        if peer.is_empty() {
            return Err(RuntimeError::ConnectionClosed);
        }
        debug!(local = %self.local_proxy().id(), remote = %peer.id(), "channel connected");
        self.set_remote(peer);
        Ok(())
    }

    pub fn open(&self, params: Params) -> Result<()> {
        self.linked_remote()?.open(params)
    }

    /// Close the connection. The remote link is dropped once the peer
    /// accepted the close.
    pub fn close(&self, params: Params) -> Result<()> {
        let remote = self.linked_remote()?;
        remote.close(params)?;

        let mut link = self.remote.lock();
        if *link == remote {
            let old = mem::take(&mut *link);
            drop(link);
            debug!(remote = %old.id(), "channel closed");
            drop(old);
        }
        Ok(())
    }

    pub fn send(&self, message: Params, priority: Priority) -> Result<()> {
        self.linked_remote()?.send(message, priority)
    }

    pub fn ctrl(&self, request: Params) -> Result<Params> {
        self.linked_remote()?.ctrl(request)
    }

    /// Make the channel unusable: drop the handler, the session back
    /// reference and the remote link. Proxies into this channel report
    /// `ConnectionClosed` from now on.
    ///
    /// Dropping the handler or the remote link may destroy other sessions;
    /// no lock is held while that happens.
    pub fn reset(&self) {
        self.core.alive.store(false, Ordering::Release);
        let handler = self.core.handler.write().take();
        let session = self.core.session.write().take();
        let remote = mem::take(&mut *self.remote.lock());
        debug!(remote = %remote.id(), "channel reset");

        drop(remote);
        drop(handler);
        drop(session);
    }
}
