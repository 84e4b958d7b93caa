//! `fpga-clock`: answers FPGA clock board button presses with the host's time or date.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fpga_clock_host::config::ConfigOverrides;
use fpga_clock_host::link::list_ports;
use fpga_clock_host::metric_defs::describe_metrics;
use fpga_clock_host::{Exit, HostConfig, PollLoop, PortLink, ShutdownSignal, SystemClock};
use serialport::SerialPortType;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fpga-clock")]
#[command(about = "Send the host's time or date to an FPGA clock board over serial", long_about = None)]
struct Cli {
    /// YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial device (e.g. COM10, /dev/ttyUSB0)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Delay after opening the port in milliseconds
    #[arg(long, value_name = "MS")]
    settle_ms: Option<u64>,

    /// Pause after each reply byte in milliseconds
    #[arg(long, value_name = "MS")]
    byte_delay_ms: Option<u64>,

    /// Sleep between polls in milliseconds
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            read_timeout_ms: self.timeout_ms,
            settle_ms: self.settle_ms,
            byte_delay_ms: self.byte_delay_ms,
            poll_interval_ms: self.poll_ms,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_ports() -> ExitCode {
    match list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("No serial ports found");
            ExitCode::SUCCESS
        }
        Ok(ports) => {
            for port in ports {
                match port.port_type {
                    SerialPortType::UsbPort(info) => println!(
                        "{}  USB {:04x}:{:04x} {}",
                        port.port_name,
                        info.vid,
                        info.pid,
                        info.product.unwrap_or_default()
                    ),
                    _ => println!("{}", port.port_name),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_banner() {
    println!("=== FPGA Clock/Date System ===");
    println!("Waiting for button press from FPGA...");
    println!("Button 0 (Center): Request Time");
    println!("Button 1 (Up): Request Date");
    println!("Press Ctrl+C to exit\n");
}

/// Print the banner unless the operator already asked to stop.
fn start_session(shutdown: &ShutdownSignal) -> bool {
    if shutdown.is_triggered() {
        return false;
    }
    print_banner();
    true
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_ports {
        return print_ports();
    }

    let mut config = match &cli.config {
        Some(path) => match HostConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => HostConfig::default(),
    };
    config.apply(cli.overrides());
    debug!(?config, "Configuration");

    describe_metrics();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.install_ctrlc() {
        error!("Failed to install Ctrl+C handler: {}", e);
        return ExitCode::FAILURE;
    }

    let link = match PortLink::open(&config) {
        Ok(link) => link,
        Err(e) => {
            eprintln!("\nError: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !start_session(&shutdown) {
        // Interrupted during the settling delay.
        drop(link);
        println!("\n\nClosing serial port...");
        println!("Done.");
        return ExitCode::SUCCESS;
    }

    let mut poll = PollLoop::from_config(link, SystemClock, shutdown, &config);
    let exit = poll.run();
    match &exit {
        Exit::Interrupted => println!("Done."),
        Exit::Fault(e) => {
            eprintln!("\nError: {}", e);
        }
    }

    ExitCode::from(exit.code() as u8)
}
