//! Douyu live-room barrage client.
//!
//! Connects to the public barrage server, logs in for a room and streams the
//! room's chat messages, viewer-join notices and every other server message.
//!
//! # Crate Structure
//!
//! - [`frame`]: wire framing and the `key@=value/` body codec
//! - [`room`]: room sessions with login, heartbeat and message fan-out

/// Re-export frame types.
pub mod frame {
    pub use barrage_frame::*;
}

/// Re-export room session types.
pub mod room {
    pub use barrage_room::*;
}

pub use barrage_room::{Message, Room, RoomConfig, RoomError, RoomState, SubscriptionKind};
