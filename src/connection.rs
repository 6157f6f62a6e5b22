//! The per-connection protocol state machine.
//!
//! A [`Connection`] never touches a socket. It is handed the bytes read so far and
//! answers with an [`Action`]: how many of those bytes it consumed and what, if
//! anything, must be written back.

use tracing::{debug, info, trace, warn};

use crate::{
    CloseFrame, FramesCodec, Message, OpCode,
    codec::CLOSE_FRAME,
    error::{FrameDecodeError, HandshakeError},
    handshake,
    http::{self, RequestHead},
    options::ConnectionOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingHandshake,
    Open,
    Closed,
}

/// The application message layer.
///
/// Returns the payload to send back, or `None` to stay silent.
pub trait OnMessage {
    fn on_message(&mut self, message: Message<'_>) -> Option<Vec<u8>>;
}

impl<F> OnMessage for F
where
    F: FnMut(Message<'_>) -> Option<Vec<u8>>,
{
    fn on_message(&mut self, message: Message<'_>) -> Option<Vec<u8>> {
        self(message)
    }
}

/// What the transport must do after handing bytes to a [`Connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing was consumed. Read more bytes and try again.
    NeedMore,
    /// Drop `consumed` bytes, send nothing.
    Discard { consumed: usize },
    /// Drop `consumed` bytes and send `bytes`.
    Reply { consumed: usize, bytes: Vec<u8> },
    /// Drop `consumed` bytes, send `bytes`, then release the transport.
    Close { consumed: usize, bytes: Vec<u8> },
}

#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    codec: FramesCodec,
    /// Bytes of a rejected frame that have not arrived yet.
    skip: u64,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(ConnectionOptions::default())
    }
}

impl Connection {
    pub const fn new(options: ConnectionOptions) -> Self {
        Self {
            state: ConnectionState::AwaitingHandshake,
            codec: options.codec(),
            skip: 0,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub const fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    /// Feeds the bytes read so far. Bytes not consumed must be presented again, followed by newer ones.
    pub fn on_bytes<H>(&mut self, src: &[u8], handler: &mut H) -> Action
    where
        H: OnMessage + ?Sized,
    {
        if src.is_empty() {
            return Action::NeedMore;
        }

        match self.state {
            ConnectionState::AwaitingHandshake => self.on_handshake(src),
            ConnectionState::Open if self.skip > 0 => self.on_skip(src),
            ConnectionState::Open => self.on_frame(src, handler),
            ConnectionState::Closed => Action::Discard {
                consumed: src.len(),
            },
        }
    }

    /// The peer closed its side without a close frame.
    pub fn on_eof(&mut self) {
        if !self.is_closed() {
            info!(state = ?self.state, "Peer hung up");
        }

        self.state = ConnectionState::Closed;
    }

    fn on_handshake(&mut self, src: &[u8]) -> Action {
        let (method, path, len) = match http::inspect(src) {
            RequestHead::Partial => return Action::NeedMore,
            RequestHead::Complete { method, path, len } => (method, path, len),
            RequestHead::NotHttp | RequestHead::Malformed => {
                warn!(len = src.len(), "Dropping input received before handshake");

                return Action::Discard {
                    consumed: src.len(),
                };
            }
        };

        if method != "GET" {
            warn!(method, "Dropping non-GET upgrade request");

            return Action::Discard { consumed: len };
        }

        let response = core::str::from_utf8(&src[..len])
            .map_err(|_| HandshakeError::InvalidKey)
            .and_then(handshake::build_handshake_response);

        match response {
            Ok(response) => {
                info!(path, "Handshake accepted");

                self.state = ConnectionState::Open;

                Action::Reply {
                    consumed: len,
                    bytes: response.into_bytes(),
                }
            }
            Err(err) => {
                warn!(%err, path, "Handshake rejected");

                Action::Discard { consumed: len }
            }
        }
    }

    /// Drops the remainder of a rejected frame as it arrives.
    fn on_skip(&mut self, src: &[u8]) -> Action {
        let consumed = usize::try_from(self.skip).map_or(src.len(), |skip| skip.min(src.len()));

        self.skip -= consumed as u64;

        trace!(consumed, left = self.skip, "Skipping rejected frame");

        Action::Discard { consumed }
    }

    fn on_frame<H>(&mut self, src: &[u8], handler: &mut H) -> Action
    where
        H: OnMessage + ?Sized,
    {
        let (frame, consumed) = match self.codec.decode(src) {
            Ok(decoded) => decoded,
            Err(FrameDecodeError::Incomplete) => return Action::NeedMore,
            Err(err) => return self.reject(src, err),
        };

        debug!(
            opcode = ?frame.opcode(),
            len = frame.payload().len(),
            masked = frame.is_masked(),
            "Frame received"
        );

        match frame.opcode() {
            OpCode::Close => {
                match CloseFrame::parse(frame.payload()) {
                    Some(close) => info!(code = ?close.code(), reason = close.reason(), "Close received"),
                    None => info!("Close received"),
                }

                self.state = ConnectionState::Closed;

                Action::Close {
                    consumed,
                    bytes: CLOSE_FRAME.to_vec(),
                }
            }
            OpCode::Ping => match self.codec.encode(true, OpCode::Pong, frame.payload(), None) {
                Ok(bytes) => Action::Reply { consumed, bytes },
                Err(err) => {
                    warn!(%err, "Cannot answer ping");

                    Action::Discard { consumed }
                }
            },
            OpCode::Pong => Action::Discard { consumed },
            OpCode::Text | OpCode::Binary | OpCode::Continuation => {
                let Some(message) = Message::from_frame(&frame) else {
                    warn!("Dropping text frame with invalid UTF-8");

                    return Action::Discard { consumed };
                };

                let Some(response) = handler.on_message(message) else {
                    return Action::Discard { consumed };
                };

                match self.codec.encode(true, OpCode::Text, &response, None) {
                    Ok(bytes) => Action::Reply { consumed, bytes },
                    Err(err) => {
                        warn!(%err, "Dropping response");

                        Action::Discard { consumed }
                    }
                }
            }
        }
    }

    /// Drops a frame the codec refused.
    ///
    /// When the frame's length is known only that frame is dropped, including the part
    /// still to come. Otherwise the stream cannot be realigned and everything buffered goes.
    fn reject(&mut self, src: &[u8], err: FrameDecodeError) -> Action {
        let Some(frame_len) = err.frame_len() else {
            warn!(%err, len = src.len(), "Dropping malformed input");

            return Action::Discard {
                consumed: src.len(),
            };
        };

        warn!(%err, frame_len, "Dropping frame");

        match usize::try_from(frame_len) {
            Ok(frame_len) if frame_len <= src.len() => Action::Discard {
                consumed: frame_len,
            },
            _ => {
                self.skip = frame_len - src.len() as u64;

                Action::Discard {
                    consumed: src.len(),
                }
            }
        }
    }
}
