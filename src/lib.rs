pub mod cli;
pub mod config;
pub mod hand;
pub mod logging;
pub mod serial;

pub use config::TransportConfig;
pub use hand::HandPose;
pub use serial::{Command, ConnectionState, SerialCommandTransport, TransportError};

/// Entry point for the `hand-link` binary
pub fn run() -> anyhow::Result<()> {
    logging::init();
    let args = cli::parse_args(std::env::args().skip(1))?;
    cli::execute(args)
}
