use std::fmt::Display;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Inbound operation a channel handler may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Connect,
    Open,
    Close,
    Receive,
    Control,
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bstr = match self {
            Self::Connect => "connect",
            Self::Open => "open",
            Self::Close => "close",
            Self::Receive => "receive",
            Self::Control => "control",
        };
        f.write_str(bstr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// Channel is not connected, or already connected on `connect`.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("{0} not supported")]
    CapabilityNotSupported(Capability),

    /// Operation through an empty or dead proxy.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("load error: {0}")]
    LoadError(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Programming error, e.g. arming a timer that is already armed.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// Failure raised by protocol code from inside a handler or timer callback.
    #[error("callback failed: {0}")]
    Callback(String),
}

impl RuntimeError {
    pub fn not_connected() -> Self {
        Self::InvalidState(String::from("not connected"))
    }

    pub fn already_connected() -> Self {
        Self::InvalidState(String::from("already connected"))
    }

    pub fn callback(msg: impl Display) -> Self {
        Self::Callback(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, RuntimeError};

    #[test]
    fn messages() {
        assert_eq!(RuntimeError::not_connected().to_string(), "invalid state: not connected");
        assert_eq!(
            RuntimeError::CapabilityNotSupported(Capability::Control).to_string(),
            "control not supported"
        );
        assert_eq!(RuntimeError::ConnectionClosed.to_string(), "connection closed");
    }
}
