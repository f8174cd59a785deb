use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// `tokio_util` codec for barrage frames.
#[derive(Debug, Clone, Default)]
pub struct BarrageCodec {
    config: FrameConfig,
}

impl BarrageCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for BarrageCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        decode_frame(src, self.config.max_body_size)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => {
                debug!(remaining = buf.len(), "stream ended mid-frame");
                Err(FrameError::ConnectionClosed)
            }
        }
    }
}

impl Encoder<Frame> for BarrageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        if item.body.len() > self.config.max_body_size {
            return Err(FrameError::BodyTooLarge {
                size: item.body.len(),
                max: self.config.max_body_size,
            });
        }
        encode_frame(item.msg_type, &item.body, dst)
    }
}
