pub mod debugger;
pub mod exec;
pub mod handshake;
pub mod kube;
pub mod session;
pub mod tunnel;

pub use debugger::{DebuggerConfig, DebuggerKind};
pub use handshake::SessionHandle;
pub use session::{DebugSession, SessionRequest};
pub use tunnel::Tunnel;
