//! Sensor Shell Command-Line Client
//!
//! Finds the board on the serial ports, reads analog pins and I2C sensors
//! from its shell, and prints the results.
//!
//! ## Usage
//!
//! ```bash
//! # List serial ports and whether they look like the board
//! sonde ports
//!
//! # Read channels (auto-detects the board)
//! sonde read A0 i1
//!
//! # Read from a specific port
//! sonde read --port /dev/ttyACM1 A0
//!
//! # Show or create the settings file
//! sonde config
//! sonde config init
//! ```

mod settings;

use anyhow::{bail, Context, Result};
use sonde_detect::{PortDescriptor, PortScanner};
use sonde_link::SensorShell;
use sonde_protocol::SensorReading;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

const USAGE: &str = "\
Usage:
  sonde ports
  sonde read [--port NAME] [CHANNEL...]
  sonde config [init]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ports,
    Read {
        port: Option<String>,
        channels: Vec<String>,
    },
    ShowConfig,
    InitConfig,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        bail!("missing command\n{}", USAGE);
    };

    match command.as_str() {
        "ports" => Ok(Command::Ports),
        "read" => {
            let mut port = None;
            let mut channels = Vec::new();
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                if arg == "--port" {
                    let name = iter.next().context("--port needs a port name")?;
                    port = Some(name.clone());
                } else {
                    channels.push(arg.clone());
                }
            }
            Ok(Command::Read { port, channels })
        }
        "config" => match rest.first().map(String::as_str) {
            None => Ok(Command::ShowConfig),
            Some("init") => Ok(Command::InitConfig),
            Some(other) => bail!("unknown config action '{}'\n{}", other, USAGE),
        },
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            std::process::exit(0);
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn list_ports(settings: &Settings) -> Result<()> {
    let detector = settings.detector();
    let ports = PortScanner::new().enumerate_ports()?;

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in &ports {
        let ids = match (port.vendor_id, port.product_id) {
            (Some(vid), Some(pid)) => format!("{:04X}:{:04X}", vid, pid),
            (Some(vid), None) => format!("{:04X}:----", vid),
            _ => "---------".to_string(),
        };
        let board = port.label().unwrap_or("");
        let marker = if detector.matches(port) { "*" } else { " " };
        println!("{} {:<24} {}  {}", marker, port.name, ids, board);
    }

    Ok(())
}

fn format_reading(reading: &SensorReading) -> String {
    match reading {
        SensorReading::I2c(v) => format!("{} (0x{:04X})", v, v),
        other => other.to_string(),
    }
}

async fn read_channels(settings: &Settings, port: Option<String>, channels: Vec<String>) -> Result<()> {
    let channels = if channels.is_empty() {
        settings.channels.clone()
    } else {
        channels
    };
    if channels.is_empty() {
        bail!("no channels given and none configured\n{}", USAGE);
    }

    let shell = SensorShell::serial(settings.query_config()).with_detector(settings.detector());

    let port = match port {
        Some(name) => {
            let port = PortDescriptor::new(name, None);
            shell.open(&port).await?;
            port
        }
        None => shell
            .detect_and_open()
            .await
            .context("Use `sonde ports` to see available ports, or pass --port")?,
    };
    tracing::info!("Reading {} channel(s) from {}", channels.len(), port.name);

    let mut failures = 0;
    for token in &channels {
        let channel = match token.parse() {
            Ok(channel) => channel,
            Err(e) => {
                eprintln!("{}: {}", token, e);
                failures += 1;
                continue;
            }
        };
        match shell.query(&channel).await {
            Ok(reading) => println!("{} = {}", token, format_reading(&reading)),
            Err(e) => {
                eprintln!("{}: {}", token, e);
                failures += 1;
            }
        }
    }

    shell.close().await?;

    if failures > 0 {
        bail!("{} of {} channel(s) failed", failures, channels.len());
    }
    Ok(())
}

fn show_config(settings: &Settings) -> Result<()> {
    match Settings::settings_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no settings path available"),
    }
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sonde=info,sonde_protocol=info,sonde_detect=info,sonde_link=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    let settings = Settings::load();

    match command {
        Command::Ports => list_ports(&settings),
        Command::Read { port, channels } => read_channels(&settings, port, channels).await,
        Command::ShowConfig => show_config(&settings),
        Command::InitConfig => {
            let path = settings.save()?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
