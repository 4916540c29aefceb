mod artnet;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use vdmx_core::{ARTNET_PORT, Bridge, BridgeConfig, SerialPortTransport, shutdown};

#[derive(Parser, Debug)]
#[command(author, version, about = "Art-Net to USB-DMX Pro serial bridge", long_about = None)]
struct Args {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(short, long, default_value = "vdmx.toml")]
    config: PathBuf,

    /// Serial port, overrides the config file
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate, overrides the config file
    #[arg(long)]
    baud: Option<u32>,

    /// Art-Net universe, overrides the config file
    #[arg(long)]
    universe: Option<u8>,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.list_ports {
        for port in SerialPortTransport::available_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let mut config = BridgeConfig::load_or_init(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(universe) = args.universe {
        config.universe = universe;
    }
    config.validate()?;

    info!(
        port = %config.port,
        baud = config.baud_rate,
        port_address = %format!("0x{:04X}", config.port_address()),
        "Starting vdmx bridge"
    );

    let transport = SerialPortTransport::open(&config.port, config.baud_rate, config.read_timeout())
        .with_context(|| format!("opening serial port {}", config.port))?;
    let bridge = Arc::new(Bridge::new(Arc::new(transport)).with_link_timeout(config.link_timeout()));

    let (trigger, signal) = shutdown::channel();
    {
        let trigger = trigger.clone();
        ctrlc::set_handler(move || {
            info!("Interrupted, shutting down");
            trigger.trigger();
        })
        .context("installing Ctrl-C handler")?;
    }

    let watchdog = bridge.spawn_watchdog(config.watchdog_period(), signal.clone())?;

    let ip: IpAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address))?;
    let listener = artnet::spawn_listener(
        SocketAddr::new(ip, ARTNET_PORT),
        config.port_address(),
        Arc::clone(&bridge),
        signal.clone(),
    );
    let listener = match listener {
        Ok(handle) => handle,
        Err(e) => {
            trigger.trigger();
            watchdog.join();
            bridge.close();
            return Err(e);
        }
    };

    let result = bridge.run_serial_reader(&signal);

    trigger.trigger();
    bridge.close();
    watchdog.join();
    if listener.join().is_err() {
        warn!("Art-Net listener panicked");
    }
    info!("Bridge stopped");
    result
}
