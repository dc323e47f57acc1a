//! ByteLang Bridge Binary
//!
//! Port discovery and the manipulator sweep demo.

use std::thread;
use std::time::Duration;

use bytelang::robot::{Robot, HOLD};
use bytelang::stream::SerialLink;
use bytelang::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// ByteLang Bridge
#[derive(Parser, Debug)]
#[command(name = "bytelang-bridge")]
#[command(about = "Host side of the ByteLang serial bridge")]
#[command(version)]
struct Args {
    /// Serial device (discovered when omitted)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Only consider devices whose name contains this text
    #[arg(short, long, default_value = "USB")]
    filter: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List candidate serial devices
    Ports,

    /// Sweep the manipulator joints through their range
    Sweep,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bytelang=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .baud_rate(args.baud)
        .port_filter(Some(args.filter).filter(|f| !f.is_empty()));
    if let Some(port) = &args.port {
        builder = builder.port(port);
    }
    let config = builder.build();

    let result = match args.command {
        Commands::Ports => list_ports(&config),
        Commands::Sweep => sweep(&config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn list_ports(config: &Config) -> bytelang::Result<()> {
    let ports = SerialLink::discover(config)?;
    if ports.is_empty() {
        tracing::warn!("No ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

fn sweep(config: &Config) -> bytelang::Result<()> {
    tracing::info!("ByteLang Bridge v{}", bytelang::VERSION);

    let mut robot = Robot::connect(config)?;
    robot.start_poll_task(config)?;

    let fast = Duration::from_millis(5);
    let slow = Duration::from_millis(10);

    for i in 0..180u8 {
        robot.set_manipulator(HOLD, i)?;
        thread::sleep(fast);
    }

    for i in (2..=180u8).rev().step_by(2) {
        robot.set_manipulator(HOLD, i)?;
        thread::sleep(slow);
    }

    for i in (91..=180u8).rev() {
        robot.set_manipulator(i, HOLD)?;
        thread::sleep(slow);
    }

    for i in 90..180u8 {
        robot.set_manipulator(i, HOLD)?;
        thread::sleep(slow);
    }

    robot.set_manipulator(HOLD, HOLD)?;

    // Let trailing log lines arrive before shutting the link down
    thread::sleep(Duration::from_secs(1));
    robot.stop()
}
