//! Wire types shared between the copilot server and its clients.

mod copilot;
mod messages;

pub use copilot::*;
pub use messages::*;
