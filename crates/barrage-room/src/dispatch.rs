use std::sync::Arc;

use barrage_frame::{stt, BarrageCodec, FrameConfig, SERVER_MESSAGE_TYPE};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, watch};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::error::{Result, RoomError};
use crate::message::Message;
use crate::room::RoomState;
use crate::subscription::{SubscriptionKind, Subscriptions};
use crate::writer::RoomWriter;

/// Reads frames off the connection and fans decoded messages out to
/// subscribers, in arrival order, until the connection fails.
pub(crate) struct Dispatcher<R, W> {
    frames: FramedRead<R, BarrageCodec>,
    writer: RoomWriter<W>,
    room_id: String,
    group_id: String,
    subscriptions: Arc<Subscriptions>,
    login: Option<oneshot::Sender<()>>,
    state: Arc<watch::Sender<RoomState>>,
}

impl<R, W> Dispatcher<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        reader: R,
        writer: RoomWriter<W>,
        room_id: String,
        group_id: String,
        max_body_size: usize,
        subscriptions: Arc<Subscriptions>,
        login: oneshot::Sender<()>,
        state: Arc<watch::Sender<RoomState>>,
    ) -> Self {
        let codec = BarrageCodec::with_config(FrameConfig { max_body_size });
        Self {
            frames: FramedRead::new(reader, codec),
            writer,
            room_id,
            group_id,
            subscriptions,
            login: Some(login),
            state,
        }
    }

    /// Run the read loop. Only returns on failure.
    pub(crate) async fn run(mut self) -> Result<()> {
        loop {
            let frame = match self.frames.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => {
                    warn!(room_id = %self.room_id, error = %err, "frame read failed");
                    return Err(err.into());
                }
                None => {
                    info!(room_id = %self.room_id, "server closed the connection");
                    return Err(RoomError::Disconnected);
                }
            };

            if frame.msg_type != SERVER_MESSAGE_TYPE {
                debug!(msg_type = frame.msg_type, "unexpected frame type tag");
            }

            let fields = stt::decode(&frame.body).map_err(|err| {
                warn!(room_id = %self.room_id, error = %err, "frame body decode failed");
                err
            })?;
            let message = Message::from_fields(fields);
            debug!(room_id = %self.room_id, msg_type = message.type_name(), "received message");

            self.dispatch(message).await?;
        }
    }

    async fn dispatch(&mut self, message: Message) -> Result<()> {
        match &message {
            Message::LoginResponse(_) => self.on_login().await?,
            Message::Chat(_) => {
                self.subscriptions
                    .deliver(SubscriptionKind::Chat, &message)
                    .await
            }
            Message::UserEnter(_) => {
                self.subscriptions
                    .deliver(SubscriptionKind::Join, &message)
                    .await
            }
            _ => {}
        }
        self.subscriptions
            .deliver(SubscriptionKind::All, &message)
            .await;
        Ok(())
    }

    async fn on_login(&mut self) -> Result<()> {
        let Some(login) = self.login.take() else {
            warn!(room_id = %self.room_id, "duplicate loginres ignored");
            return Ok(());
        };
        self.state.send_replace(RoomState::LoggedIn);

        // Join-group goes out before heartbeats are released.
        self.writer
            .send(&Message::join_group(&self.room_id, &self.group_id))
            .await?;
        let _ = login.send(());

        info!(room_id = %self.room_id, group_id = %self.group_id, "logged in and joined barrage group");
        Ok(())
    }
}
