use embedded_io_async::{Read, Write};
use tracing::{debug, trace};

use crate::{
    connection::{Action, Connection, ConnectionState, OnMessage},
    error::SessionError,
    options::ConnectionOptions,
};

/// Drives a [`Connection`] over a stream until it is closed.
///
/// Bytes a read leaves undecoded stay at the front of the buffer, so a frame
/// split across several reads is decoded once it is complete.
#[derive(Debug)]
pub struct Session<'buf, RW> {
    inner: RW,
    connection: Connection,
    buffer: &'buf mut [u8],
    filled: usize,
}

impl<'buf, RW> Session<'buf, RW> {
    pub const fn new(inner: RW, buffer: &'buf mut [u8], options: ConnectionOptions) -> Self {
        Self {
            inner,
            connection: Connection::new(options),
            buffer,
            filled: 0,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns reference to the reader/writer.
    pub const fn inner(&self) -> &RW {
        &self.inner
    }

    /// Consumes the [`Session`] and returns the reader/writer.
    pub fn into_inner(self) -> RW {
        self.inner
    }

    /// Reads, decodes and answers until the connection is closed or the peer hangs up.
    pub async fn run<H>(&mut self, handler: &mut H) -> Result<(), SessionError<RW::Error>>
    where
        RW: Read + Write,
        H: OnMessage + ?Sized,
    {
        while !self.connection.is_closed() {
            if self.filled == self.buffer.len() {
                return Err(SessionError::BufferFull);
            }

            let read = self
                .inner
                .read(&mut self.buffer[self.filled..])
                .await
                .map_err(SessionError::Read)?;

            if read == 0 {
                self.connection.on_eof();

                break;
            }

            trace!(read, "Bytes received");

            self.filled += read;

            self.drain(handler).await?;
        }

        Ok(())
    }

    /// Hands buffered bytes to the connection until it needs more or closes.
    async fn drain<H>(&mut self, handler: &mut H) -> Result<(), SessionError<RW::Error>>
    where
        RW: Write,
        H: OnMessage + ?Sized,
    {
        while self.filled > 0 && !self.connection.is_closed() {
            let action = self
                .connection
                .on_bytes(&self.buffer[..self.filled], handler);

            let consumed = match action {
                Action::NeedMore => break,
                Action::Discard { consumed } => consumed,
                Action::Reply { consumed, bytes } | Action::Close { consumed, bytes } => {
                    self.send(&bytes).await?;

                    consumed
                }
            };

            self.buffer.copy_within(consumed..self.filled, 0);
            self.filled -= consumed;
        }

        if self.connection.is_closed() {
            debug!(left = self.filled, "Connection closed");

            self.filled = 0;
        }

        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), SessionError<RW::Error>>
    where
        RW: Write,
    {
        self.inner
            .write_all(bytes)
            .await
            .map_err(SessionError::Write)?;

        self.inner.flush().await.map_err(SessionError::Write)
    }
}
