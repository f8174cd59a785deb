//! Douyu barrage room sessions.
//!
//! A [`Room`] dials the barrage server, logs in for one room id, joins the
//! room's barrage group once the login is acknowledged, keeps the connection
//! alive with heartbeats, and fans decoded messages out to subscribers:
//! chat messages, viewer-join notices, and a catch-all stream.
//!
//! ```no_run
//! # async fn demo() -> barrage_room::Result<()> {
//! use std::sync::Arc;
//!
//! let room = Arc::new(barrage_room::Room::new("288016"));
//! let mut chat = room.subscribe_chat(64);
//!
//! let session = {
//!     let room = Arc::clone(&room);
//!     tokio::spawn(async move { room.run().await })
//! };
//!
//! while let Some(message) = chat.recv().await {
//!     println!("{}: {}", message.get("nn").unwrap_or("?"), message.get("txt").unwrap_or(""));
//! }
//! # let _ = session.await;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod dispatch;
pub mod error;
mod heartbeat;
pub mod message;
pub mod room;
pub mod subscription;
mod writer;

pub use config::{RoomConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_SERVER_ADDR};
pub use error::{Result, RoomError};
pub use message::{
    Message, DEFAULT_GROUP_ID, TYPE_CHAT, TYPE_HEARTBEAT, TYPE_JOIN_GROUP, TYPE_LOGIN_REQUEST,
    TYPE_LOGIN_RESPONSE, TYPE_USER_ENTER,
};
pub use room::{Room, RoomState};
pub use subscription::SubscriptionKind;
