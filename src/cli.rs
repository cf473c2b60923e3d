use std::path::PathBuf;
use anyhow::{anyhow, bail, Context};

use crate::config::TransportConfig;
use crate::hand::HandPose;
use crate::serial::{discover_ports, Command, SerialCommandTransport};

pub const USAGE: &str = "\
Usage: hand-link [--config FILE] [--port PORT] [--baud RATE] <COMMAND>

Commands:
  ports          List available serial ports
  send <LINE>    Send one protocol line, e.g. 3,270,270,400
  pose <NAME>    Send a preset hand pose
  help           Show this message";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Ports,
    Send(Command),
    Pose { name: String, pose: HandPose },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub action: Action,
}

pub fn parse_args<I>(args: I) -> anyhow::Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut port = None;
    let mut baud = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(next_value(&mut args, "--config")?));
            }
            "--port" => {
                port = Some(next_value(&mut args, "--port")?);
            }
            "--baud" => {
                let value = next_value(&mut args, "--baud")?;
                let rate = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid baud rate: {}", value))?;
                baud = Some(rate);
            }
            "ports" => return finish(config_path, port, baud, Action::Ports),
            "send" => {
                let line = next_value(&mut args, "send")?;
                let command: Command = line.parse()?;
                return finish(config_path, port, baud, Action::Send(command));
            }
            "pose" => {
                let name = next_value(&mut args, "pose")?;
                let pose = HandPose::preset(&name).ok_or_else(|| {
                    let known: Vec<&str> = HandPose::preset_names().collect();
                    anyhow!("unknown pose '{}' (known: {})", name, known.join(", "))
                })?;
                return finish(config_path, port, baud, Action::Pose { name, pose });
            }
            "help" | "--help" | "-h" => return finish(config_path, port, baud, Action::Help),
            other => bail!("unexpected argument '{}'\n\n{}", other, USAGE),
        }
    }

    finish(config_path, port, baud, Action::Help)
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> anyhow::Result<String> {
    args.next().ok_or_else(|| anyhow!("{} needs a value", flag))
}

fn finish(
    config_path: Option<PathBuf>,
    port: Option<String>,
    baud: Option<u32>,
    action: Action,
) -> anyhow::Result<CliArgs> {
    Ok(CliArgs {
        config_path,
        port,
        baud,
        action,
    })
}

/// Config file (or defaults) with command-line overrides applied
pub fn resolve_config(args: &CliArgs) -> anyhow::Result<TransportConfig> {
    let mut config = match &args.config_path {
        Some(path) => TransportConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => TransportConfig::default(),
    };

    if let Some(port) = &args.port {
        config.port_name = port.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

pub fn execute(args: CliArgs) -> anyhow::Result<()> {
    match &args.action {
        Action::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Action::Ports => {
            let ports = discover_ports().context("failed to list serial ports")?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                match (port.vid, port.pid) {
                    (Some(vid), Some(pid)) => println!(
                        "{}\t{:04X}:{:04X}\t{}",
                        port.port_name,
                        vid,
                        pid,
                        port.product.as_deref().unwrap_or("")
                    ),
                    _ => println!("{}", port.port_name),
                }
            }
            Ok(())
        }
        Action::Send(command) => {
            let config = resolve_config(&args)?;
            with_transport(&config, |transport| transport.send(command))
        }
        Action::Pose { name, pose } => {
            let config = resolve_config(&args)?;
            log::info!("Sending pose '{}'", name);
            with_transport(&config, |transport| transport.send_pose(pose))
        }
    }
}

fn with_transport<F>(config: &TransportConfig, action: F) -> anyhow::Result<()>
where
    F: FnOnce(&SerialCommandTransport) -> crate::serial::Result<()>,
{
    let transport = SerialCommandTransport::new();
    transport.open(config)?;
    let result = action(&transport);
    transport.close()?;
    result.with_context(|| format!("failed to send to {}", config.port_name))
}
