use crate::{Frame, OpCode};

/// An application message carried by a single data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    Text(&'a str),
    /// A binary WebSocket message
    Binary(&'a [u8]),
}

impl<'a> Message<'a> {
    /// Views a data frame as a message.
    ///
    /// Returns `None` for control frames and for text frames that are not valid UTF-8.
    /// Continuation frames are never reassembled and are handed over as binary.
    pub fn from_frame(frame: &'a Frame) -> Option<Self> {
        match frame.opcode() {
            OpCode::Text => core::str::from_utf8(frame.payload()).ok().map(Message::Text),
            OpCode::Binary | OpCode::Continuation => Some(Message::Binary(frame.payload())),
            OpCode::Close | OpCode::Ping | OpCode::Pong => None,
        }
    }

    /// Indicates whether a message is a text message.
    pub fn is_text(&self) -> bool {
        matches!(*self, Message::Text(_))
    }

    /// Indicates whether a message is a binary message.
    pub fn is_binary(&self) -> bool {
        matches!(*self, Message::Binary(_))
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Message::Text(payload) => payload.as_bytes(),
            Message::Binary(payload) => payload,
        }
    }

    /// Get the length of the WebSocket message.
    pub const fn len(&self) -> usize {
        match self {
            Message::Text(payload) => payload.len(),
            Message::Binary(payload) => payload.len(),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
