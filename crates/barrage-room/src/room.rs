use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RoomConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Result, RoomError};
use crate::heartbeat::keep_alive;
use crate::message::Message;
use crate::subscription::{SubscriptionKind, Subscriptions};
use crate::writer::RoomWriter;

/// Lifecycle of a room session.
///
/// `Created → Connecting → AwaitingLogin → LoggedIn → Running → Terminated`,
/// or `Connecting → Failed` when the dial fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Created,
    Connecting,
    AwaitingLogin,
    LoggedIn,
    Running,
    Terminated,
    Failed,
}

/// A barrage session for one live room.
///
/// Subscribe to the streams you need, then drive the session with
/// [`Room::run`]. Subscriptions may be added while the session runs; messages
/// decoded before a stream is subscribed are not replayed to it.
pub struct Room {
    room_id: String,
    config: RoomConfig,
    subscriptions: Arc<Subscriptions>,
    state: Arc<watch::Sender<RoomState>>,
    shutdown: CancellationToken,
    started: AtomicBool,
}

impl Room {
    /// Create an unconnected room using the public server defaults.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self::with_config(room_id, RoomConfig::default())
    }

    /// Create an unconnected room with explicit configuration.
    pub fn with_config(room_id: impl Into<String>, config: RoomConfig) -> Self {
        Self {
            room_id: room_id.into(),
            config,
            subscriptions: Arc::new(Subscriptions::new()),
            state: Arc::new(watch::channel(RoomState::Created).0),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Current session state.
    pub fn state(&self) -> RoomState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn watch_state(&self) -> watch::Receiver<RoomState> {
        self.state.subscribe()
    }

    /// Receive `chatmsg` messages, queueing up to `buffer` of them.
    pub fn subscribe_chat(&self, buffer: usize) -> mpsc::Receiver<Message> {
        self.subscribe(SubscriptionKind::Chat, buffer)
    }

    /// Receive `uenter` (viewer joined) messages.
    pub fn subscribe_join(&self, buffer: usize) -> mpsc::Receiver<Message> {
        self.subscribe(SubscriptionKind::Join, buffer)
    }

    /// Receive every decoded message, whatever its type.
    pub fn subscribe_all(&self, buffer: usize) -> mpsc::Receiver<Message> {
        self.subscribe(SubscriptionKind::All, buffer)
    }

    /// Activate `kind` and return its queue.
    ///
    /// A buffer of 0 is treated as 1. Calling again replaces the queue and
    /// closes the previous receiver. A full queue stalls the whole read loop,
    /// so consumers should keep up.
    pub fn subscribe(&self, kind: SubscriptionKind, buffer: usize) -> mpsc::Receiver<Message> {
        debug!(room_id = %self.room_id, stream = %kind, buffer, "subscribing");
        self.subscriptions.subscribe(kind, buffer)
    }

    /// Whether `kind` currently has a live queue.
    pub fn is_subscribed(&self, kind: SubscriptionKind) -> bool {
        self.subscriptions.is_active(kind)
    }

    /// Fire the terminate signal. [`Room::run`] returns shortly after.
    pub fn terminate(&self) {
        self.shutdown.cancel();
    }

    /// Connect, log in and run the session until terminated or broken.
    ///
    /// Returns `Ok(())` after [`Room::terminate`], or the error that ended the
    /// session. Either way the connection is closed and every subscription
    /// ends. Dropping the returned future also tears the session down.
    pub async fn run(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RoomError::AlreadyStarted(self.room_id.clone()));
        }
        if self.config.heartbeat_interval.is_zero() {
            self.fail();
            return Err(RoomError::InvalidConfig(
                "heartbeat interval must be greater than zero".to_string(),
            ));
        }

        let _teardown = Teardown { room: self };
        if self.shutdown.is_cancelled() {
            return Ok(());
        }

        self.set_state(RoomState::Connecting);
        let connected = tokio::select! {
            _ = self.shutdown.cancelled() => {
                info!(room_id = %self.room_id, "terminate requested while connecting");
                return Ok(());
            }
            connected = self.connect() => connected,
        };
        let stream = match connected {
            Ok(stream) => stream,
            Err(err) => {
                warn!(room_id = %self.room_id, error = %err, "connect failed");
                self.fail();
                return Err(err);
            }
        };

        self.drive(stream).await
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = self.config.server_addr.as_str();
        let dial = TcpStream::connect(addr);
        let result = match self.config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, dial)
                .await
                .map_err(|_| RoomError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout,
                })?,
            None => dial.await,
        };
        let stream = result.map_err(|source| RoomError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        info!(room_id = %self.room_id, addr, "connected to barrage server");
        Ok(stream)
    }

    async fn drive(&self, stream: TcpStream) -> Result<()> {
        let (read_half, write_half) = stream.into_split();
        let writer = RoomWriter::new(write_half);

        let login = Message::login_request(&self.room_id);
        tokio::select! {
            _ = self.shutdown.cancelled() => {
                info!(room_id = %self.room_id, "terminate requested before login");
                return Ok(());
            }
            sent = writer.send(&login) => sent?,
        }
        self.set_state(RoomState::AwaitingLogin);
        info!(room_id = %self.room_id, "login request sent");

        let (login_tx, login_rx) = oneshot::channel();
        let dispatcher = Dispatcher::new(
            read_half,
            writer.clone(),
            self.room_id.clone(),
            self.config.group_id.clone(),
            self.config.max_body_size,
            Arc::clone(&self.subscriptions),
            login_tx,
            Arc::clone(&self.state),
        );

        // Dropping the set aborts both tasks, which closes the socket halves.
        let mut tasks = JoinSet::new();
        tasks.spawn(dispatcher.run());
        tasks.spawn(keep_alive(
            writer,
            login_rx,
            self.config.heartbeat_interval,
            Arc::clone(&self.state),
        ));

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(room_id = %self.room_id, "terminate requested");
                    return Ok(());
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok(Ok(()))) => continue,
                    Some(Ok(Err(err))) => {
                        warn!(room_id = %self.room_id, error = %err, "session ended");
                        return Err(err);
                    }
                    Some(Err(err)) => return Err(RoomError::Task(err.to_string())),
                    None => return Ok(()),
                },
            }
        }
    }

    fn set_state(&self, state: RoomState) {
        debug!(room_id = %self.room_id, ?state, "state change");
        self.state.send_replace(state);
    }

    fn fail(&self) {
        self.subscriptions.close();
        self.set_state(RoomState::Failed);
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("room_id", &self.room_id)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Closes subscriptions and marks the room terminated on every exit path of
/// `run`, including cancellation of its future.
struct Teardown<'a> {
    room: &'a Room,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.room.subscriptions.close();
        self.room.state.send_if_modified(|state| {
            if *state == RoomState::Failed || *state == RoomState::Terminated {
                false
            } else {
                *state = RoomState::Terminated;
                true
            }
        });
        debug!(room_id = %self.room.room_id, "session torn down");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn new_room_is_created_and_idle() {
        let room = Room::new("288016");
        assert_eq!(room.room_id(), "288016");
        assert_eq!(room.state(), RoomState::Created);
        assert_eq!(room.config().server_addr, crate::config::DEFAULT_SERVER_ADDR);
    }

    #[tokio::test]
    async fn zero_heartbeat_interval_is_rejected() {
        let config = RoomConfig::default().with_heartbeat_interval(Duration::ZERO);
        let room = Room::with_config("1", config);
        let err = room.run().await.unwrap_err();
        assert!(matches!(err, RoomError::InvalidConfig(_)));
        assert_eq!(room.state(), RoomState::Failed);
    }

    #[tokio::test]
    async fn terminate_before_run_skips_connecting() {
        let config = RoomConfig::default().with_server_addr("127.0.0.1:1");
        let room = Room::with_config("1", config);
        let mut chat = room.subscribe_chat(1);
        room.terminate();

        assert!(room.is_subscribed(SubscriptionKind::Chat));
        assert!(!room.is_subscribed(SubscriptionKind::Join));

        room.run().await.unwrap();
        assert_eq!(room.state(), RoomState::Terminated);
        assert!(chat.recv().await.is_none());
        assert!(!room.is_subscribed(SubscriptionKind::Chat));
    }
}
