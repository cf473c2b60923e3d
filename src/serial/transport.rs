use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use serde::{Deserialize, Serialize};

use crate::config::TransportConfig;
use crate::hand::HandPose;
use super::interface::{Connector, SerialConnector};
use super::protocol::{Command, FingerJoints, ThumbJoints};
use super::{Result, TransportError};

/// Connection lifecycle.
///
/// `Closed -> Open` on a successful open, `Closed|Failed -> Failed` on a failed
/// one, `Open -> Failed` on a write error and `Open|Failed -> Closed` on close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
    Failed,
}

struct Link<P> {
    state: ConnectionState,
    port: Option<P>,
    config: Option<TransportConfig>,
    last_error: Option<String>,
    // Part of a line reached the device before a write failed. Survives close
    // so the next session can terminate the fragment.
    torn_line: bool,
}

impl<P> Link<P> {
    fn fail(&mut self, reason: String) {
        self.port = None;
        self.config = None;
        self.state = ConnectionState::Failed;
        self.last_error = Some(reason);
    }
}

/// Owns the serial connection to the actuator controller and writes one
/// protocol line per command.
///
/// Every operation takes `&self` and runs under a single lock, so the
/// transport can be shared between threads behind an `Arc`. Writes block the
/// caller until the line is flushed or the configured write timeout expires;
/// `close` waits for an in-flight write the same way.
pub struct SerialCommandTransport<C: Connector = SerialConnector> {
    connector: C,
    link: Mutex<Link<C::Port>>,
}

impl SerialCommandTransport {
    pub fn new() -> Self {
        Self::with_connector(SerialConnector)
    }
}

impl Default for SerialCommandTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> SerialCommandTransport<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            link: Mutex::new(Link {
                state: ConnectionState::Closed,
                port: None,
                config: None,
                last_error: None,
                torn_line: false,
            }),
        }
    }

    // A panic mid-write leaves the link consistent enough to report on and close.
    fn lock(&self) -> MutexGuard<'_, Link<C::Port>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Configuration of the current session; None unless open
    pub fn config(&self) -> Option<TransportConfig> {
        self.lock().config.clone()
    }

    /// Reason for the most recent open or write failure
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Open the configured serial device.
    ///
    /// Fails with `AlreadyOpen` while a session is active, even if `config`
    /// differs from the current one; close first to switch ports. If an earlier
    /// session died mid-line, a bare newline is written first so the firmware
    /// discards the fragment instead of prefixing it to the next command.
    pub fn open(&self, config: &TransportConfig) -> Result<()> {
        let mut link = self.lock();

        if link.state == ConnectionState::Open {
            return Err(TransportError::AlreadyOpen);
        }

        if let Err(e) = config.validate() {
            let reason = e.to_string();
            log::error!("Refusing to open serial port {}: {}", config.port_name, reason);
            link.fail(reason.clone());
            return Err(TransportError::OpenFailed(reason));
        }

        match self.connector.connect(config) {
            Ok(mut port) => {
                if link.torn_line {
                    if let Err(e) = write_all(&mut port, b"\n").1 {
                        let reason = format!("failed to terminate partial line: {}", e);
                        log::error!("Serial port {}: {}", config.port_name, reason);
                        link.fail(reason.clone());
                        return Err(TransportError::OpenFailed(reason));
                    }
                    log::debug!("Terminated partial line left by the previous session");
                    link.torn_line = false;
                }
                link.port = Some(port);
                link.config = Some(config.clone());
                link.state = ConnectionState::Open;
                link.last_error = None;
                log::info!("Connected to actuator controller on {}", config.port_name);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                log::error!("Failed to open serial port {}: {}", config.port_name, reason);
                link.fail(reason.clone());
                Err(TransportError::OpenFailed(reason))
            }
        }
    }

    /// Release the device. Closing a closed transport is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut link = self.lock();

        match link.state {
            ConnectionState::Closed => return Ok(()),
            ConnectionState::Open => {
                if let Some(mut port) = link.port.take() {
                    if let Err(e) = port.flush() {
                        log::warn!("Flush before close failed: {}", e);
                    }
                }
                if let Some(config) = &link.config {
                    log::info!("Disconnecting from {}", config.port_name);
                }
            }
            ConnectionState::Failed => {
                link.port = None;
                log::debug!("Closing failed serial transport");
            }
        }

        link.config = None;
        link.state = ConnectionState::Closed;
        Ok(())
    }

    /// Write one command line. Returns `NotConnected` without touching the
    /// device unless the transport is open.
    pub fn send(&self, command: &Command) -> Result<()> {
        let mut link = self.lock();
        Self::send_locked(&mut link, command)
    }

    /// Write several commands back to back without letting other senders in
    /// between. Stops at the first error.
    pub fn send_all(&self, commands: &[Command]) -> Result<()> {
        self.send_batch(commands).1
    }

    /// Like `send_all`, also reporting how many commands were written before
    /// the first error.
    pub fn send_batch(&self, commands: &[Command]) -> (usize, Result<()>) {
        let mut link = self.lock();
        for (sent, command) in commands.iter().enumerate() {
            if let Err(e) = Self::send_locked(&mut link, command) {
                return (sent, Err(e));
            }
        }
        (commands.len(), Ok(()))
    }

    /// Send the three commands that make up a full hand pose
    pub fn send_pose(&self, pose: &HandPose) -> Result<()> {
        self.send_all(&pose.commands())
    }

    /// Index (02) and middle (03) fingers
    #[allow(clippy::too_many_arguments)]
    pub fn send_command1(
        &self,
        prox02: i32,
        med02: i32,
        dist02: i32,
        lat02: i32,
        prox03: i32,
        med03: i32,
        dist03: i32,
        lat03: i32,
    ) -> Result<()> {
        self.send(&Command::IndexMiddle {
            index: FingerJoints::new(prox02, med02, dist02, lat02),
            middle: FingerJoints::new(prox03, med03, dist03, lat03),
        })
    }

    /// Ring (04) and pinky (05) fingers
    #[allow(clippy::too_many_arguments)]
    pub fn send_command2(
        &self,
        prox04: i32,
        med04: i32,
        dist04: i32,
        lat04: i32,
        prox05: i32,
        med05: i32,
        dist05: i32,
        lat05: i32,
    ) -> Result<()> {
        self.send(&Command::RingPinky {
            ring: FingerJoints::new(prox04, med04, dist04, lat04),
            pinky: FingerJoints::new(prox05, med05, dist05, lat05),
        })
    }

    /// Thumb (01)
    pub fn send_command3(&self, prox01: i32, dist01: i32, lat01: i32) -> Result<()> {
        self.send(&Command::Thumb(ThumbJoints::new(prox01, dist01, lat01)))
    }

    fn send_locked(link: &mut Link<C::Port>, command: &Command) -> Result<()> {
        if link.state != ConnectionState::Open {
            log::debug!("Dropping command {} while {:?}", command.tag(), link.state);
            return Err(TransportError::NotConnected);
        }

        command.validate()?;
        let line = command.encode();

        let bytes = line.as_bytes();
        let (written, result) = match link.port.as_mut() {
            Some(port) => write_all(port, bytes),
            None => (0, Err(io::Error::from(io::ErrorKind::NotConnected))),
        };

        match result {
            Ok(()) => {
                log::debug!("Sent: {}", line.trim_end());
                Ok(())
            }
            Err(e) => {
                let err = if e.kind() == io::ErrorKind::TimedOut {
                    TransportError::Timeout
                } else {
                    TransportError::WriteFailed(e.to_string())
                };
                log::error!("Serial write failed, marking transport failed: {}", e);
                if written > 0 && written < bytes.len() {
                    link.torn_line = true;
                }
                link.fail(err.to_string());
                Err(err)
            }
        }
    }
}

// Write and flush, returning how many bytes the port accepted before any error.
fn write_all<W: Write>(port: &mut W, bytes: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < bytes.len() {
        match port.write(&bytes[written..]) {
            Ok(0) => return (written, Err(io::Error::from(io::ErrorKind::WriteZero))),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, port.flush())
}
