// Recording stand-in for a serial device.
#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hand_link_lib::config::TransportConfig;
use hand_link_lib::serial::Connector;

#[derive(Default)]
struct DeviceState {
    written: Vec<u8>,
    write_calls: usize,
    opens: usize,
    refuse_open: bool,
    fail_writes: Option<io::ErrorKind>,
    // Bytes still accepted before every write fails with the given kind
    fail_after: Option<(usize, io::ErrorKind)>,
    max_chunk: Option<usize>,
    write_delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector(self.clone())
    }

    pub fn written(&self) -> String {
        String::from_utf8(self.state.lock().unwrap().written.clone()).expect("utf8 on the wire")
    }

    pub fn lines(&self) -> Vec<String> {
        self.written().lines().map(str::to_string).collect()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn refuse_open(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_open = refuse;
    }

    pub fn fail_writes(&self, kind: Option<io::ErrorKind>) {
        let mut state = self.state.lock().unwrap();
        state.fail_writes = kind;
        state.fail_after = None;
    }

    /// Accept `bytes` more bytes, then fail every write with `kind`
    pub fn fail_after_bytes(&self, bytes: usize, kind: io::ErrorKind) {
        self.state.lock().unwrap().fail_after = Some((bytes, kind));
    }

    /// Accept at most `n` bytes per write call, like a busy UART driver
    pub fn max_chunk(&self, n: usize) {
        self.state.lock().unwrap().max_chunk = Some(n);
    }

    pub fn write_delay(&self, delay: Duration) {
        self.state.lock().unwrap().write_delay = Some(delay);
    }
}

pub struct MockPort {
    device: MockDevice,
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let delay = {
            let mut state = self.device.state.lock().unwrap();
            state.write_calls += 1;
            if let Some(kind) = state.fail_writes {
                return Err(io::Error::new(kind, "simulated device fault"));
            }
            if let Some((0, kind)) = state.fail_after {
                return Err(io::Error::new(kind, "simulated device fault"));
            }
            state.write_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.device.state.lock().unwrap();
        let mut n = state.max_chunk.map_or(buf.len(), |max| buf.len().min(max));
        if let Some((budget, kind)) = state.fail_after {
            n = n.min(budget);
            state.fail_after = Some((budget - n, kind));
        }
        state.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct MockConnector(pub MockDevice);

impl Connector for MockConnector {
    type Port = MockPort;

    fn connect(&self, _config: &TransportConfig) -> io::Result<MockPort> {
        let mut state = self.0.state.lock().unwrap();
        if state.refuse_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }
        state.opens += 1;
        Ok(MockPort {
            device: self.0.clone(),
        })
    }
}

pub fn test_config() -> TransportConfig {
    TransportConfig::new("/dev/ttyMOCK0", 115200)
}
