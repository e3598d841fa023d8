pub mod channel;
pub mod directory;
pub mod environment;
pub mod errors;
pub mod plugin;
pub mod session;
pub mod timer;

pub use channel::{Callbacks, Channel, ChannelHandler, ChannelProxy, Params, Priority};
pub use directory::{EndPoint, ServiceDirectory};
pub use environment::{config::Settings, logger::LogLevel, Environment};
pub use errors::{Capability, Result, RuntimeError};
pub use plugin::{BuiltinLoader, ModuleLoader, Plugin};
pub use session::{Session, SessionBase};
pub use timer::{Timer, TimerManager};
