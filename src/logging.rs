//! Log output for the `hand-link` binary.
//!
//! Library code logs through the `log` facade. `init` installs a
//! `tracing-subscriber` formatter on stderr that also picks up those `log`
//! records, filtered by `RUST_LOG` with INFO as the default level.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    // Ignore the error when a subscriber is already installed (tests, embedding hosts).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
