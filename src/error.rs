//! Error types.

/// Errors raised while turning an upgrade request into a handshake response.
///
/// A handshake error aborts only the current attempt. The connection keeps waiting for a valid retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("Invalid Sec-WebSocket-Key")]
    InvalidKey,
    #[error("Sec-WebSocket-Key header not found")]
    HeaderNotFound,
}

/// Errors raised while decoding a frame.
///
/// Variants carrying a `frame_len` were rejected after the header was read, so the
/// rejected frame can be skipped and the stream stays aligned on the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameDecodeError {
    /// Not enough bytes for the declared header and payload. Wait for more.
    #[error("Incomplete frame")]
    Incomplete,
    /// A data frame without payload.
    #[error("Empty payload")]
    EmptyPayload { frame_len: usize },
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: u64, max: usize, frame_len: u64 },
    /// A control frame that is fragmented or longer than 125 bytes.
    #[error("Invalid control frame")]
    InvalidControlFrame { frame_len: u64 },
    /// The header itself cannot be trusted, neither can anything after it.
    #[error("Malformed frame header")]
    MalformedHeader,
}

impl FrameDecodeError {
    /// Returns `true` if the caller should retry once more bytes are available.
    pub const fn is_incomplete(&self) -> bool {
        matches!(self, FrameDecodeError::Incomplete)
    }

    /// Returns the number of bytes the rejected frame occupies on the wire, header included,
    /// or `None` if its boundary is unknown.
    pub const fn frame_len(&self) -> Option<u64> {
        match *self {
            FrameDecodeError::EmptyPayload { frame_len } => Some(frame_len as u64),
            FrameDecodeError::PayloadTooLarge { frame_len, .. }
            | FrameDecodeError::InvalidControlFrame { frame_len } => Some(frame_len),
            FrameDecodeError::Incomplete | FrameDecodeError::MalformedHeader => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("Payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
}

/// Errors that end a [`Session`](crate::session::Session).
#[derive(Debug, thiserror::Error)]
pub enum SessionError<I> {
    #[error("Read error: {0:?}")]
    Read(I),
    #[error("Write error: {0:?}")]
    Write(I),
    /// The read buffer filled up without yielding a complete handshake or frame.
    #[error("Read buffer full")]
    BufferFull,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(
        #[source]
        #[from]
        std::io::Error,
    ),
    #[error("JSON error: {0}")]
    Json(
        #[source]
        #[from]
        serde_json::Error,
    ),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(
        #[source]
        #[from]
        std::io::Error,
    ),
    #[error("Session error: {0}")]
    Session(
        #[source]
        #[from]
        SessionError<std::io::Error>,
    ),
    #[error("Persist error: {0}")]
    Persist(
        #[source]
        #[from]
        PersistError,
    ),
}
