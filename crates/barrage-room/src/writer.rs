use std::sync::Arc;

use barrage_frame::{stt, BarrageCodec, Frame};
use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::codec::FramedWrite;
use tracing::debug;

use crate::error::Result;
use crate::message::Message;

/// The single write path to a room connection.
///
/// Clones share one framed sink behind a lock, so frames written from the
/// dispatcher and the heartbeat task never interleave on the wire.
pub(crate) struct RoomWriter<W> {
    inner: Arc<Mutex<FramedWrite<W, BarrageCodec>>>,
}

impl<W> Clone for RoomWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin> RoomWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FramedWrite::new(inner, BarrageCodec::new()))),
        }
    }

    /// Encode `message` and write it as one client frame.
    pub(crate) async fn send(&self, message: &Message) -> Result<()> {
        let body = stt::encode(&message.to_fields());
        let frame = Frame::client(body);
        debug!(msg_type = message.type_name(), size = frame.wire_size(), "sending frame");

        let mut sink = self.inner.lock().await;
        sink.send(frame).await?;
        Ok(())
    }
}
