//! Wire framing for the Douyu barrage protocol.
//!
//! Every message travels as one frame:
//! - A 4-byte little-endian length, written twice
//! - A 2-byte message type tag (689 client, 690 server)
//! - One encrypt byte and one reserved byte (both zero)
//! - An STT key/value body terminated by NUL
//!
//! [`codec`] handles the header, [`stt`] the body. The `async` feature adds a
//! `tokio_util` codec for use with `FramedRead`/`FramedWrite`.

pub mod codec;
pub mod error;
pub mod stt;
#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, CLIENT_MESSAGE_TYPE, DEFAULT_MAX_BODY,
    HEADER_OVERHEAD, HEADER_SIZE, SERVER_MESSAGE_TYPE,
};
pub use error::{FrameError, Result};
pub use stt::{Fields, TYPE_KEY};
#[cfg(feature = "async")]
pub use tokio_codec::BarrageCodec;
