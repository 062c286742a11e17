// Motor control module for the sumo bot's differential drive
//
// Provides:
// - The actuator interface the decoder output is applied through
// - TB6612FNG dual H-bridge implementation over embedded-hal pins
// - Serial pin bridge to the driver board
// - In-memory fakes for tests and simulation

pub mod bridge;
pub mod mock;
pub mod tb6612;

use serde::{Deserialize, Serialize};

pub use bridge::{BridgeError, BridgePin, BridgePwm, PinBridge};
pub use mock::{MockPin, MockPwm};
pub use tb6612::{DriverError, DriverPins, Tb6612};

/// Which motor a command is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorId {
    Left,
    Right,
    /// Applies to both channels. Only meaningful for disable-all: direction
    /// outputs all low, duty zero.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

/// Upper bound of a speed percentage
pub const FULL_SPEED: u8 = 100;

/// Fire-and-forget interface to the two drive motors.
///
/// Implementations never report failures to the caller; whatever goes wrong
/// at the hardware is at most logged.
pub trait MotorActuator {
    /// Assert or release the shared standby line
    fn enable(&mut self, on: bool);

    /// Set the direction outputs of `motor`
    fn set_direction(&mut self, motor: MotorId, direction: Direction);

    /// Set the duty of `motor` from a percentage in 0..=100
    fn set_speed(&mut self, motor: MotorId, speed: u8);
}

/// Map a speed percentage onto 0..=max_duty. Integer division truncates, so
/// 50% of 255 is 127. Percentages above 100 are clamped.
pub fn speed_to_duty(speed: u8, max_duty: u16) -> u16 {
    let speed = speed.min(FULL_SPEED) as u32;
    (speed * max_duty as u32 / FULL_SPEED as u32) as u16
}
