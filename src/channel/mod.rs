use std::fmt::Display;

pub mod channel;
pub mod handler;
pub mod proxy;

pub use channel::Channel;
pub use handler::{Callbacks, ChannelHandler};
pub use proxy::ChannelProxy;

/// Free-form structured value carried by every channel operation.
pub type Params = serde_json::Value;

/// Default parameter value, an empty object.
pub fn empty() -> Params {
    Params::Object(serde_json::Map::new())
}

/// Delivery hint forwarded verbatim to the receiving handler.
/// The channel layer never reorders by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    #[default]
    Routine,
    Priority,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Routine => f.write_str("routine"),
            Self::Priority => f.write_str("priority"),
        }
    }
}
