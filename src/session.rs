use std::sync::{Arc, Weak};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;
use crate::{channel::{Channel, ChannelProxy}, errors::{Result, RuntimeError}};

/// Lifecycle root of a protocol endpoint.
///
/// A session keeps itself alive after [`spawn`] until [`Session::reset`]
/// releases that reference. From then on it lives only as long as some
/// [`ChannelProxy`] still points into one of its channels.
pub trait Session: Send + Sync + 'static {
    fn base(&self) -> &SessionBase;

    fn id(&self) -> &str {
        self.base().id()
    }

    /// Release the self reference. May destroy the session once the caller
    /// drops its own handle.
    fn reset(&self) {
        self.base().reset()
    }
}

/// State shared by every session: the identifier and the keep-alive slot.
pub struct SessionBase {
    id: String,
    this: Mutex<Option<Arc<dyn Session>>>,
}

impl SessionBase {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), this: Mutex::new(None) }
    }

    /// Session base identified by a fresh random UUID.
    pub fn with_uuid() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn local_proxy(&self, channel: &Channel) -> ChannelProxy {
        channel.local_proxy()
    }

    /// Wire a channel to a remote proxy directly, skipping the connect
    /// handshake. Used for in-process wiring.
    pub fn set_remote(&self, channel: &Channel, proxy: ChannelProxy) {
        channel.set_remote(proxy)
    }

    /// Accept an incoming connect on `channel`: keep the backlink as the
    /// remote link and hand out the channel's own proxy.
    pub fn accept(&self, channel: &Channel, backlink: ChannelProxy) -> Result<ChannelProxy> {
        if channel.is_connected() {
            return Err(RuntimeError::already_connected());
        }
        let local = channel.local_proxy();
        if local.is_empty() {
            return Err(RuntimeError::ConnectionClosed);
        }
        channel.set_remote(backlink);
        Ok(local)
    }

    /// Whether the session still holds its own keep-alive reference.
    pub fn is_retained(&self) -> bool {
        self.this.lock().is_some()
    }

    pub fn reset(&self) {
        let this = self.this.lock().take();
        if this.is_some() {
            debug!(session = %self.id, "session released");
        }
        drop(this);
    }

    fn retain(&self, this: Arc<dyn Session>) {
        *self.this.lock() = Some(this);
    }
}

impl Drop for SessionBase {
    fn drop(&mut self) {
        debug!(session = %self.id, "session destroyed");
    }
}

/// Build a session and make it keep itself alive.
///
/// The builder receives the weak self reference that channels need to bind
/// to their owner:
///
/// ```ignore
/// let s = session::spawn(|me| Beacon {
///     base: SessionBase::with_uuid(),
///     channel: Channel::new(me),
/// });
/// ```
pub fn spawn<S, F>(build: F) -> Arc<S>
where
    S: Session,
    F: FnOnce(&Weak<S>) -> S,
{
    let session = Arc::new_cyclic(build);
    session.base().retain(session.clone());
    debug!(session = %session.id(), "session created");
    session
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::channel::Channel;
    use super::{spawn, Session, SessionBase};

    struct Idle {
        base: SessionBase,
        channel: Channel,
    }

    impl Session for Idle {
        fn base(&self) -> &SessionBase {
            &self.base
        }
    }

    fn idle(id: &str) -> Arc<Idle> {
        spawn(|me| Idle { base: SessionBase::new(id), channel: Channel::new(me) })
    }

    #[test]
    fn keeps_itself_alive_until_reset() {
        let session = idle("idle");
        let weak = Arc::downgrade(&session);
        drop(session);
        assert!(weak.upgrade().is_some());

        if let Some(s) = weak.upgrade() {
            assert!(s.base().is_retained());
            s.reset();
            assert!(!s.base().is_retained());
        }
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn proxy_outlives_reset() {
        let session = idle("held");
        let proxy = session.channel.local_proxy();
        assert_eq!(proxy.id(), "held");

        let weak = Arc::downgrade(&session);
        session.reset();
        drop(session);
        assert!(weak.upgrade().is_some());
        assert!(proxy.is_valid());

        drop(proxy);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn uuid_ids_are_unique() {
        let a = SessionBase::with_uuid();
        let b = SessionBase::with_uuid();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 36);
    }
}
