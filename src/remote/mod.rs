//! The running session: one actor owning state and transport, reached
//! through a cloneable handle.

mod actor;
mod channel;
mod handle;

pub use channel::CommandChannel;
pub use handle::SessionHandle;
