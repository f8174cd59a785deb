use std::time::Duration;

/// Errors that can occur in room session operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Failed to dial the barrage server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Dialing the barrage server did not finish in time.
    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Frame-level error while reading, decoding or writing.
    #[error("frame error: {0}")]
    Frame(#[from] barrage_frame::FrameError),

    /// The server closed the connection.
    #[error("server closed the connection")]
    Disconnected,

    /// `run` was called on a room that has already been started.
    #[error("room {0} has already been started")]
    AlreadyStarted(String),

    /// The room configuration cannot be used.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),

    /// A session task ended abnormally.
    #[error("session task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RoomError>;
