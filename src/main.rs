use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rc_sumo_runtime::config::{Args, RuntimeConfig};
use rc_sumo_runtime::motor::{DriverPins, PinBridge, Tb6612};
use rc_sumo_runtime::runtime;

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let config = RuntimeConfig::from(Args::parse());

    if let Err(e) = start(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn start(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if config.sim {
        info!("Simulation mode, pin writes stay in memory");
        let mut motors = Tb6612::new(DriverPins::simulated(&config.pins, config.max_duty));
        motors.initialize()?;
        runtime::run(&config, motors).await
    } else {
        info!("Opening pin bridge on {}", config.port);
        let pins = PinBridge::open(&config.port, config.baudrate)?
            .into_driver_pins(&config.pins, config.max_duty)?;
        let mut motors = Tb6612::new(pins);
        motors.initialize()?;
        runtime::run(&config, motors).await
    }
}
