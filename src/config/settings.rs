use std::path::Path;
use serde::{Deserialize, Serialize};

// Host defaults used by the controller scripts
pub const DEFAULT_PORT_NAME: &str = "COM3";
pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where and how fast to talk to the actuator controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl TransportConfig {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_write_timeout_ms(mut self, write_timeout_ms: u64) -> Self {
        self.write_timeout_ms = write_timeout_ms;
        self
    }

    /// Load a JSON config file. Missing keys fall back to the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TransportConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::debug!("Loaded transport config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port_name.trim().is_empty() {
            return Err(ConfigError::Invalid("port name is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud rate must be positive".to_string()));
        }
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("write timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.port_name, "COM3");
        assert_eq!(config.baud_rate, 115200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(TransportConfig::new("", 9600).validate().is_err());
        assert!(TransportConfig::new("/dev/ttyUSB0", 0).validate().is_err());
        assert!(TransportConfig::new("/dev/ttyUSB0", 9600)
            .with_write_timeout_ms(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TransportConfig =
            serde_json::from_str(r#"{ "port_name": "/dev/ttyACM0" }"#).expect("should parse");
        assert_eq!(config.port_name, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.write_timeout_ms, DEFAULT_WRITE_TIMEOUT_MS);
    }

    #[test]
    fn test_load_from_file() {
        let name = format!("hand-link-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let json = r#"{ "port_name": "/dev/ttyUSB1", "baud_rate": 9600 }"#;
        std::fs::write(&path, json).expect("write config");

        let config = TransportConfig::load_from(&path).expect("should load");
        assert_eq!(config, TransportConfig::new("/dev/ttyUSB1", 9600));

        std::fs::write(&path, r#"{ "baud_rate": 0 }"#).expect("write config");
        assert!(matches!(TransportConfig::load_from(&path), Err(ConfigError::Invalid(_))));

        let _ = std::fs::remove_file(&path);
    }
}
