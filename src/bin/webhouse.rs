use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, builder::RangedU64ValueParser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use webhouse::{
    device::SimulatedDevices,
    options::{ConnectionOptions, ServerOptions},
    server::Server,
};

/// Upper bound for `--max-payload`. The read buffer is sized from it.
const MAX_PAYLOAD_LIMIT: u64 = 16 * 1024 * 1024;

/// Serves the home-automation actuators to a browser over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "webhouse", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Actuator state file, restored at startup and written on shutdown.
    #[arg(long = "state", default_value = "data.json")]
    state_path: PathBuf,

    /// Largest payload a client frame may declare, in bytes.
    #[arg(
        long,
        default_value_t = webhouse::codec::DEFAULT_MAX_PAYLOAD_LEN,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_PAYLOAD_LIMIT),
    )]
    max_payload: usize,

    /// Send responses above 125 bytes using the extended length forms.
    #[arg(long)]
    extended_frames: bool,

    /// Log filter, e.g. `info` or `webhouse=debug`. `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn options(&self) -> ServerOptions {
        let connection = ConnectionOptions::default()
            .with_max_payload_len(self.max_payload)
            .with_extended_frames(self.extended_frames);

        ServerOptions::default()
            .with_bind(self.bind)
            .with_state_path(&self.state_path)
            .with_connection(connection)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let server = Server::new(args.options(), SimulatedDevices::default());

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Cannot listen for ctrl-c");

            std::future::pending::<()>().await;
        }
    };

    server.run(shutdown).await?;

    Ok(())
}
