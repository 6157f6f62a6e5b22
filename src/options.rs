//! Connection and server configuration.

use std::{net::SocketAddr, path::PathBuf};

use crate::{FramesCodec, codec::DEFAULT_MAX_PAYLOAD_LEN, frame::MAX_HEADER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Frames declaring a longer payload are dropped before any allocation.
    pub max_payload_len: usize,
    /// Send responses above 125 bytes using the extended length forms.
    ///
    /// Off by default: such responses are dropped.
    pub extended_frames: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            extended_frames: false,
        }
    }
}

impl ConnectionOptions {
    pub const fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    pub const fn with_extended_frames(mut self, extended_frames: bool) -> Self {
        self.extended_frames = extended_frames;
        self
    }

    pub const fn codec(&self) -> FramesCodec {
        FramesCodec::new()
            .with_max_payload_len(self.max_payload_len)
            .with_extended_frames(self.extended_frames)
    }

    /// Smallest read buffer that can hold one frame of the maximum payload length.
    pub const fn min_read_buffer_len(&self) -> usize {
        self.max_payload_len.saturating_add(MAX_HEADER_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub bind: SocketAddr,
    /// Where actuator state is restored from at startup and saved to on shutdown.
    pub state_path: PathBuf,
    pub read_buffer_len: usize,
    pub connection: ConnectionOptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        let connection = ConnectionOptions::default();

        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            state_path: PathBuf::from("data.json"),
            read_buffer_len: connection.min_read_buffer_len(),
            connection,
        }
    }
}

impl ServerOptions {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_state_path(mut self, state_path: impl Into<PathBuf>) -> Self {
        self.state_path = state_path.into();
        self
    }

    /// Sets the connection options, growing the read buffer if it cannot hold a full frame.
    pub fn with_connection(mut self, connection: ConnectionOptions) -> Self {
        self.read_buffer_len = self.read_buffer_len.max(connection.min_read_buffer_len());
        self.connection = connection;
        self
    }

    pub fn with_read_buffer_len(mut self, read_buffer_len: usize) -> Self {
        self.read_buffer_len = read_buffer_len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ServerOptions::default();

        assert_eq!(options.bind.port(), 8000);
        assert_eq!(options.state_path, PathBuf::from("data.json"));
        assert_eq!(options.read_buffer_len, 16 * 1024 + 14);
        assert!(!options.connection.extended_frames);
    }

    #[test]
    fn read_buffer_grows_with_payload_ceiling() {
        let options = ServerOptions::default()
            .with_connection(ConnectionOptions::default().with_max_payload_len(64 * 1024));

        assert_eq!(options.read_buffer_len, 64 * 1024 + 14);
    }

    #[test]
    fn read_buffer_len_saturates() {
        let connection = ConnectionOptions::default().with_max_payload_len(usize::MAX - 1);

        assert_eq!(connection.min_read_buffer_len(), usize::MAX);
    }
}
