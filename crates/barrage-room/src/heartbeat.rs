use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::Result;
use crate::message::Message;
use crate::room::RoomState;
use crate::writer::RoomWriter;

/// Wait for the login acknowledgement, then send `mrkl` immediately and every
/// `interval` after that. Only returns early if login never happens.
pub(crate) async fn keep_alive<W>(
    writer: RoomWriter<W>,
    login: oneshot::Receiver<()>,
    interval: Duration,
    state: Arc<watch::Sender<RoomState>>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if login.await.is_err() {
        debug!("login never acknowledged; heartbeat not started");
        return Ok(());
    }

    info!(?interval, "starting heartbeat");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        writer.send(&Message::Heartbeat).await?;
        state.send_if_modified(|current| {
            if *current == RoomState::LoggedIn {
                *current = RoomState::Running;
                true
            } else {
                false
            }
        });
    }
}
