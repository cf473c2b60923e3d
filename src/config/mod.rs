pub mod settings;

pub use settings::{
    ConfigError, TransportConfig, DEFAULT_BAUD_RATE, DEFAULT_PORT_NAME, DEFAULT_WRITE_TIMEOUT_MS,
};
