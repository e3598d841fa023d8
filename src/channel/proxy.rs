use std::{fmt, sync::{Arc, Weak}};
use crate::{errors::{Result, RuntimeError}, session::Session};
use super::{channel::ChannelCore, Params, Priority};

const NULL_ID: &str = "null";

/// Capability handle for a channel.
///
/// A proxy never owns the channel, but it keeps the channel's session
/// alive. Resetting the channel turns every proxy into it invalid; calls
/// then fail with `ConnectionClosed` instead of reaching a torn down
/// endpoint.
#[derive(Clone, Default)]
pub struct ChannelProxy {
    channel: Option<Weak<ChannelCore>>,
    session: Option<Arc<dyn Session>>,
}

impl ChannelProxy {
    pub(crate) fn bind(core: &Arc<ChannelCore>) -> Self {
        if !core.is_alive() {
            return Self::default();
        }
        match core.session() {
            Some(session) => Self {
                channel: Some(Arc::downgrade(core)),
                session: Some(session),
            },
            None => Self::default(),
        }
    }

    fn core(&self) -> Result<Arc<ChannelCore>> {
        self.channel
            .as_ref()
            .and_then(Weak::upgrade)
            .filter(|core| core.is_alive())
            .ok_or(RuntimeError::ConnectionClosed)
    }

    /// True when the proxy does not reference any channel.
    pub fn is_empty(&self) -> bool {
        self.channel.is_none()
    }

    /// True when the referenced channel can still be reached.
    pub fn is_valid(&self) -> bool {
        self.core().is_ok()
    }

    pub fn connect(&self, backlink: ChannelProxy, params: Params) -> Result<ChannelProxy> {
        self.core()?.on_connect(backlink, params)
    }

    pub fn open(&self, params: Params) -> Result<()> {
        self.core()?.on_open(params)
    }

    pub fn close(&self, params: Params) -> Result<()> {
        self.core()?.on_close(params)
    }

    pub fn send(&self, message: Params, priority: Priority) -> Result<()> {
        self.core()?.on_receive(message, priority)
    }

    pub fn ctrl(&self, request: Params) -> Result<Params> {
        self.core()?.on_ctrl(request)
    }

    /// Identifier of the owning session, `"null"` for an empty proxy.
    pub fn id(&self) -> &str {
        match &self.session {
            Some(session) => session.id(),
            None => NULL_ID,
        }
    }

    /// Address of the underlying channel, for diagnostics only.
    pub fn addr(&self) -> usize {
        match &self.channel {
            Some(channel) => channel.as_ptr() as usize,
            None => 0,
        }
    }

    /// Forget the channel and release the session. May destroy the session
    /// if this was the last strong holder.
    pub fn reset(&mut self) {
        self.channel = None;
        self.session = None;
    }
}

impl PartialEq for ChannelProxy {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ChannelProxy {}

impl fmt::Debug for ChannelProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelProxy")
            .field("id", &self.id())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("valid", &self.is_valid())
            .finish()
    }
}
