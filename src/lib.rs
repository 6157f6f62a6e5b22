//! A minimal [RFC 6455](https://datatracker.ietf.org/doc/html/rfc6455) WebSocket endpoint
//! exposing home-automation actuators (lamps, heater, television, alarm) to a browser.
//!
//! The protocol engine works on byte buffers only:
//! - [`handshake`] turns the client's upgrade request into the `101 Switching Protocols` response.
//! - [`decode_frame`] / [`encode_frame`] / [`encode_close_frame`] read and write frames.
//! - [`Connection`] composes both into the `AwaitingHandshake -> Open -> Closed` lifecycle.
//!
//! Everything that touches a socket, a file or a device lives around it:
//! [`session`] drives a [`Connection`] over an [`embedded_io_async`] stream,
//! [`dispatch`] answers JSON commands through a [`device::DeviceController`],
//! [`persist`] keeps actuator state across restarts and [`server`] accepts connections one at a time.
//!
//! # Example
//!
//! ```
//! use webhouse::{Action, Connection, ConnectionState, FramesCodec, Message, OpCode};
//!
//! let mut connection = Connection::default();
//! let mut echo = |message: Message<'_>| Some(message.as_bytes().to_vec());
//!
//! let request = b"GET /ws HTTP/1.1\r\n\
//!                 Host: localhost:8000\r\n\
//!                 Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
//!                 \r\n";
//!
//! let Action::Reply { bytes, .. } = connection.on_bytes(request, &mut echo) else {
//!     panic!("Handshake failed");
//! };
//!
//! assert!(bytes.ends_with(b"Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"));
//! assert_eq!(connection.state(), ConnectionState::Open);
//!
//! // A browser masks everything it sends.
//! let frame = FramesCodec::new()
//!     .encode(true, OpCode::Text, b"hello", Some([1, 2, 3, 4]))
//!     .unwrap();
//!
//! let Action::Reply { bytes, .. } = connection.on_bytes(&frame, &mut echo) else {
//!     panic!("No reply");
//! };
//!
//! assert_eq!(bytes, [0x81, 0x05, b'h', b'e', b'l', b'l', b'o']);
//! ```

#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod close;
pub use close::{CloseCode, CloseFrame};

pub mod codec;
pub use codec::{FramesCodec, decode_frame, encode_close_frame, encode_frame};

pub mod connection;
pub use connection::{Action, Connection, ConnectionState, OnMessage};

pub mod device;

pub mod dispatch;

pub mod error;

mod frame;
pub use frame::{Frame, Header};

pub mod handshake;
pub use handshake::{
    AcceptToken, build_handshake_response, compute_accept_token, parse_handshake_request,
};

pub mod http;

mod mask;

mod message;
pub use message::Message;

mod opcode;
pub use opcode::OpCode;

pub mod options;

pub mod persist;

pub mod server;

pub mod session;
