pub mod interface;
pub mod protocol;
pub mod queued;
pub mod transport;

pub use interface::{discover_ports, Connector, SerialConnector};
pub use protocol::{Command, FingerJoints, ThumbJoints};
pub use transport::{ConnectionState, SerialCommandTransport};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    pub port_name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to open serial port: {0}")]
    OpenFailed(String),

    #[error("Serial port already open")]
    AlreadyOpen,

    #[error("Serial port not connected")]
    NotConnected,

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Write timed out")]
    Timeout,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Command queue closed")]
    QueueClosed,

    #[error("Command queue full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, TransportError>;
