/// Errors that can occur during frame or body encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The two copies of the length field in a frame header disagree.
    #[error("frame length mismatch (first {first}, second {second})")]
    LengthMismatch { first: u32, second: u32 },

    /// The length field is smaller than the fixed header overhead.
    #[error("invalid frame length {length} (minimum {min})")]
    InvalidLength { length: u32, min: u32 },

    /// The body exceeds the configured maximum size.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The body is not valid UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A body segment has no `@=` separator.
    #[error("malformed field {0:?} (missing '@=')")]
    MalformedField(String),

    /// An `@` escape is followed by something other than `A` or `S`.
    #[error("invalid escape sequence in {0:?}")]
    InvalidEscape(String),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
