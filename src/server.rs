//! The accept loop: one connection at a time, each served until it is closed.

use core::future::Future;

use embedded_io_adapters::tokio_1::FromTokio;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::{
    device::{DeviceControl, DeviceController},
    dispatch::Dispatcher,
    error::ServerError,
    options::ServerOptions,
    persist,
    session::Session,
};

#[derive(Debug)]
pub struct Server<D> {
    options: ServerOptions,
    dispatcher: Dispatcher<D>,
    buffer: Vec<u8>,
}

impl<D: DeviceControl> Server<D> {
    /// Creates a server, restoring actuator state from `options.state_path`.
    ///
    /// A missing or unreadable state file falls back to defaults: TV and heater off, lamps dark.
    pub fn new(options: ServerOptions, devices: D) -> Self {
        let mut controller = DeviceController::new(devices);

        match persist::load(&options.state_path) {
            Ok(state) => {
                info!(path = %options.state_path.display(), "State restored");

                controller.restore(&state);
            }
            Err(err) => {
                warn!(%err, path = %options.state_path.display(), "Using default state");

                controller.reset();
            }
        }

        Self {
            buffer: vec![0; options.read_buffer_len],
            dispatcher: Dispatcher::new(controller),
            options,
        }
    }

    pub const fn dispatcher(&self) -> &Dispatcher<D> {
        &self.dispatcher
    }

    /// Binds `options.bind` and serves until `shutdown` resolves.
    pub async fn run<S>(self, shutdown: S) -> Result<DeviceController<D>, ServerError>
    where
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.options.bind).await?;

        self.run_on(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` resolves, then saves the actuator state.
    pub async fn run_on<S>(
        mut self,
        listener: TcpListener,
        shutdown: S,
    ) -> Result<DeviceController<D>, ServerError>
    where
        S: Future<Output = ()>,
    {
        info!(addr = %listener.local_addr()?, "Listening");

        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(%err, "Accept failed");

                        continue;
                    }
                },
            };

            info!(%peer, "Connection established");

            tokio::select! {
                _ = &mut shutdown => break,
                result = self.serve(stream) => match result {
                    Ok(()) => info!(%peer, "Connection closed"),
                    Err(err) => warn!(%err, %peer, "Connection failed"),
                },
            }
        }

        info!("Shutting down");

        let state = self.dispatcher.controller().snapshot();

        persist::save(&self.options.state_path, &state)?;

        info!(path = %self.options.state_path.display(), "State saved");

        Ok(self.dispatcher.into_controller())
    }

    async fn serve(&mut self, stream: TcpStream) -> Result<(), ServerError> {
        let mut session = Session::new(
            FromTokio::new(stream),
            &mut self.buffer,
            self.options.connection,
        );

        session.run(&mut self.dispatcher).await?;

        Ok(())
    }
}
