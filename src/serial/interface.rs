use std::io::{self, Write};
use std::time::Duration;
use serialport::SerialPortType;

use crate::config::TransportConfig;
use super::PortInfo;

/// Opens the byte sink a transport writes command lines into.
///
/// The real implementation is [`SerialConnector`]; anything that can hand back
/// a `Write` works, which is how the transport is driven without hardware.
pub trait Connector: Send + Sync {
    type Port: Write + Send + 'static;

    fn connect(&self, config: &TransportConfig) -> io::Result<Self::Port>;
}

/// Connects to a physical serial device through the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Port = Box<dyn serialport::SerialPort>;

    fn connect(&self, config: &TransportConfig) -> io::Result<Self::Port> {
        let port = serialport::new(config.port_name.as_str(), config.baud_rate)
            .timeout(Duration::from_millis(config.write_timeout_ms))
            .open()?;

        log::info!("Opened serial port {} at {} baud", config.port_name, config.baud_rate);
        Ok(port)
    }
}

/// List serial ports visible on this machine
pub fn discover_ports() -> io::Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    let mut found = Vec::with_capacity(ports.len());

    for port in ports {
        let info = match port.port_type {
            SerialPortType::UsbPort(usb_info) => PortInfo {
                port_name: port.port_name,
                vid: Some(usb_info.vid),
                pid: Some(usb_info.pid),
                serial_number: usb_info.serial_number,
                manufacturer: usb_info.manufacturer,
                product: usb_info.product,
            },
            _ => PortInfo {
                port_name: port.port_name,
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            },
        };
        found.push(info);
    }

    log::debug!("Discovered {} serial ports", found.len());
    Ok(found)
}
