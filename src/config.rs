// Topics, loop rate, pin map and command line overrides
use std::time::Duration;

use clap::Parser;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 100;

// Zenoh topics
pub const TOPIC_RC: &str = "rc-sumo"; // control words from the remote
pub const TOPIC_RT_DRIVE: &str = "rc-sumo/rt/drive"; // applied drive
pub const TOPIC_HEALTH: &str = "rc-sumo/state/health"; // health status

// Serial pin bridge to the motor driver board
pub const BRIDGE_PORT: &str = "/dev/ttyACM0";
pub const BRIDGE_BAUDRATE: u32 = 115_200;

// Top of the PWM duty range
pub const MAX_DUTY: u16 = 255;

/// Pin assignment for the TB6612FNG dual H-bridge.
///
/// `a*` pins drive the left motor, `b*` pins the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub pwm_left: u8,
    pub bin2: u8,
    pub bin1: u8,
    pub standby: u8,
    pub ain1: u8,
    pub ain2: u8,
    pub pwm_right: u8,
}

impl PinMap {
    /// Breakout wired to a Xenon-style header (D2..D8)
    pub const XENON: PinMap = PinMap {
        pwm_left: 2,
        bin2: 3,
        bin1: 4,
        standby: 5,
        ain1: 6,
        ain2: 7,
        pwm_right: 8,
    };

    /// Every pin, in the order they are brought up at startup
    pub fn all(&self) -> [u8; 7] {
        [
            self.pwm_left,
            self.bin2,
            self.bin1,
            self.standby,
            self.ain1,
            self.ain2,
            self.pwm_right,
        ]
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::XENON
    }
}

/// Command line overrides for the compiled-in defaults
#[derive(Debug, Clone, Parser)]
#[command(name = "rc-sumo-runtime", about = "Remote-control runtime for a two-motor sumo bot")]
pub struct Args {
    /// Zenoh key expression carrying control words
    #[arg(long, default_value = TOPIC_RC)]
    pub topic: String,

    /// Serial port of the pin bridge
    #[arg(long, default_value = BRIDGE_PORT)]
    pub port: String,

    /// Serial baudrate of the pin bridge
    #[arg(long, default_value_t = BRIDGE_BAUDRATE)]
    pub baudrate: u32,

    /// Stop the motors when no command arrives for this many milliseconds
    #[arg(long)]
    pub watchdog_ms: Option<u64>,

    /// Drive an in-memory pin bus instead of the serial bridge
    #[arg(long)]
    pub sim: bool,

    /// Do not publish drive reports and health
    #[arg(long)]
    pub no_publish: bool,
}

/// Resolved configuration handed to the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub topic: String,
    pub port: String,
    pub baudrate: u32,
    pub watchdog: Option<Duration>,
    pub sim: bool,
    pub publish: bool,
    pub pins: PinMap,
    pub max_duty: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            topic: TOPIC_RC.to_string(),
            port: BRIDGE_PORT.to_string(),
            baudrate: BRIDGE_BAUDRATE,
            watchdog: None,
            sim: false,
            publish: true,
            pins: PinMap::XENON,
            max_duty: MAX_DUTY,
        }
    }
}

impl From<Args> for RuntimeConfig {
    fn from(args: Args) -> Self {
        Self {
            topic: args.topic,
            port: args.port,
            baudrate: args.baudrate,
            watchdog: args.watchdog_ms.map(Duration::from_millis),
            sim: args.sim,
            publish: !args.no_publish,
            ..Self::default()
        }
    }
}
