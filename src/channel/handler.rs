use crate::errors::{Capability, Result, RuntimeError};
use super::{ChannelProxy, Params, Priority};

/// Inbound side of a channel.
///
/// A peer reaches these methods through a [`ChannelProxy`]. Every method
/// defaults to `CapabilityNotSupported`, so a session only implements the
/// operations its protocol understands.
pub trait ChannelHandler: Send + Sync {
    /// A peer wants to connect. `backlink` points back at the caller's channel;
    /// the returned proxy is where the caller sends subsequent requests.
    fn on_connect(&self, backlink: ChannelProxy, params: Params) -> Result<ChannelProxy> {
        let _ = (backlink, params);
        Err(RuntimeError::CapabilityNotSupported(Capability::Connect))
    }

    fn on_open(&self, params: Params) -> Result<()> {
        let _ = params;
        Err(RuntimeError::CapabilityNotSupported(Capability::Open))
    }

    fn on_close(&self, params: Params) -> Result<()> {
        let _ = params;
        Err(RuntimeError::CapabilityNotSupported(Capability::Close))
    }

    fn on_receive(&self, message: Params, priority: Priority) -> Result<()> {
        let _ = (message, priority);
        Err(RuntimeError::CapabilityNotSupported(Capability::Receive))
    }

    fn on_ctrl(&self, request: Params) -> Result<Params> {
        let _ = request;
        Err(RuntimeError::CapabilityNotSupported(Capability::Control))
    }
}

type ConnectFn = Box<dyn Fn(ChannelProxy, Params) -> Result<ChannelProxy> + Send + Sync>;
type ParamsFn = Box<dyn Fn(Params) -> Result<()> + Send + Sync>;
type ReceiveFn = Box<dyn Fn(Params, Priority) -> Result<()> + Send + Sync>;
type CtrlFn = Box<dyn Fn(Params) -> Result<Params> + Send + Sync>;

/// Closure based handler with one slot per inbound operation.
/// Unset slots report `CapabilityNotSupported`.
#[derive(Default)]
pub struct Callbacks {
    connect: Option<ConnectFn>,
    open: Option<ParamsFn>,
    close: Option<ParamsFn>,
    receive: Option<ReceiveFn>,
    ctrl: Option<CtrlFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect<F>(mut self, f: F) -> Self
    where F: Fn(ChannelProxy, Params) -> Result<ChannelProxy> + Send + Sync + 'static
    {
        self.connect = Some(Box::new(f));
        self
    }

    pub fn on_open<F>(mut self, f: F) -> Self
    where F: Fn(Params) -> Result<()> + Send + Sync + 'static
    {
        self.open = Some(Box::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where F: Fn(Params) -> Result<()> + Send + Sync + 'static
    {
        self.close = Some(Box::new(f));
        self
    }

    pub fn on_receive<F>(mut self, f: F) -> Self
    where F: Fn(Params, Priority) -> Result<()> + Send + Sync + 'static
    {
        self.receive = Some(Box::new(f));
        self
    }

    pub fn on_ctrl<F>(mut self, f: F) -> Self
    where F: Fn(Params) -> Result<Params> + Send + Sync + 'static
    {
        self.ctrl = Some(Box::new(f));
        self
    }
}

impl ChannelHandler for Callbacks {
    fn on_connect(&self, backlink: ChannelProxy, params: Params) -> Result<ChannelProxy> {
        match &self.connect {
            Some(f) => f(backlink, params),
            None => Err(RuntimeError::CapabilityNotSupported(Capability::Connect)),
        }
    }

    fn on_open(&self, params: Params) -> Result<()> {
        match &self.open {
            Some(f) => f(params),
            None => Err(RuntimeError::CapabilityNotSupported(Capability::Open)),
        }
    }

    fn on_close(&self, params: Params) -> Result<()> {
        match &self.close {
            Some(f) => f(params),
            None => Err(RuntimeError::CapabilityNotSupported(Capability::Close)),
        }
    }

    fn on_receive(&self, message: Params, priority: Priority) -> Result<()> {
        match &self.receive {
            Some(f) => f(message, priority),
            None => Err(RuntimeError::CapabilityNotSupported(Capability::Receive)),
        }
    }

    fn on_ctrl(&self, request: Params) -> Result<Params> {
        match &self.ctrl {
            Some(f) => f(request),
            None => Err(RuntimeError::CapabilityNotSupported(Capability::Control)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use crate::{channel::{ChannelProxy, Priority}, errors::{Capability, RuntimeError}};
    use super::{Callbacks, ChannelHandler};

    struct Silent;
    impl ChannelHandler for Silent {}

    #[test]
    fn trait_defaults_report_each_capability() {
        let h = Silent;
        assert_eq!(
            h.on_connect(ChannelProxy::default(), json!({})).unwrap_err(),
            RuntimeError::CapabilityNotSupported(Capability::Connect)
        );
        assert_eq!(h.on_open(json!({})).unwrap_err(), RuntimeError::CapabilityNotSupported(Capability::Open));
        assert_eq!(h.on_close(json!({})).unwrap_err(), RuntimeError::CapabilityNotSupported(Capability::Close));
        assert_eq!(
            h.on_receive(json!({}), Priority::Routine).unwrap_err(),
            RuntimeError::CapabilityNotSupported(Capability::Receive)
        );
        assert_eq!(h.on_ctrl(json!({})).unwrap_err(), RuntimeError::CapabilityNotSupported(Capability::Control));
    }

    #[test]
    fn slots_are_independent() {
        let h = Callbacks::new().on_ctrl(|req| Ok(json!({ "echo": req })));
        assert_eq!(ChannelHandler::on_ctrl(&h, json!(7)).unwrap(), json!({ "echo": 7 }));
        assert_eq!(ChannelHandler::on_open(&h, json!({})).unwrap_err(), RuntimeError::CapabilityNotSupported(Capability::Open));
        assert_eq!(
            ChannelHandler::on_receive(&h, json!({}), Priority::Priority).unwrap_err(),
            RuntimeError::CapabilityNotSupported(Capability::Receive)
        );
    }
}
