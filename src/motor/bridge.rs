// Serial pin bridge to the motor driver board
//
// The board runs a small firmware that executes pin writes on our behalf.
// Packet format: [0xFF, 0xFF, Pin, Length, Instruction, Params..., Checksum]
// Writes are fire-and-forget; the board sends no status packets back.

use embedded_hal::digital::{self, OutputPin, PinState};
use embedded_hal::pwm::{self, SetDutyCycle};
use serialport::{self, SerialPort};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::tb6612::DriverPins;
use crate::config::PinMap;

/// Default serial configuration for the bridge
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    PinModeOutput = 0x01,
    DigitalWrite = 0x02,
    AnalogWrite = 0x03,
}

/// Error types for bridge communication
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge lock poisoned")]
    Poisoned,
}

impl digital::Error for BridgeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for BridgeError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Pin bridge over a byte stream, normally a serial port
pub struct PinBridge<W: Write = Box<dyn SerialPort>> {
    port: W,
}

impl PinBridge {
    /// Open a connection to the bridge
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }
}

impl<W: Write> PinBridge<W> {
    /// Wrap an already open stream
    pub fn from_writer(port: W) -> Self {
        Self { port }
    }

    /// Put every pin of `map` in output mode and hand out one handle per
    /// driver input, all sharing this bridge.
    pub fn into_driver_pins(
        mut self,
        map: &PinMap,
        max_duty: u16,
    ) -> Result<DriverPins<BridgePin<W>, BridgePwm<W>>> {
        for pin in map.all() {
            debug!("Pin {} -> output", pin);
            self.send(pin, Instruction::PinModeOutput, &[])?;
        }

        let bridge = Arc::new(Mutex::new(self));
        let pin = |pin| BridgePin {
            bridge: Arc::clone(&bridge),
            pin,
        };
        let pwm = |pin| BridgePwm {
            bridge: Arc::clone(&bridge),
            pin,
            max_duty,
        };

        Ok(DriverPins {
            ain1: pin(map.ain1),
            ain2: pin(map.ain2),
            bin1: pin(map.bin1),
            bin2: pin(map.bin2),
            standby: pin(map.standby),
            pwm_left: pwm(map.pwm_left),
            pwm_right: pwm(map.pwm_right),
        })
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(pin: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut packet = Vec::with_capacity(6 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(pin);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        // Checksum over pin, length, instruction, params
        let checksum_data = &packet[2..];
        packet.push(Self::checksum(checksum_data));

        packet
    }

    fn send(&mut self, pin: u8, instruction: Instruction, params: &[u8]) -> Result<()> {
        let packet = Self::build_packet(pin, instruction, params);
        self.port.write_all(&packet)?;
        self.port.flush()?;
        Ok(())
    }
}

fn with_bridge<W: Write>(
    bridge: &Mutex<PinBridge<W>>,
    f: impl FnOnce(&mut PinBridge<W>) -> Result<()>,
) -> Result<()> {
    let mut bridge = bridge.lock().map_err(|_| BridgeError::Poisoned)?;
    f(&mut bridge)
}

/// Digital output on the far side of the bridge
pub struct BridgePin<W: Write = Box<dyn SerialPort>> {
    bridge: Arc<Mutex<PinBridge<W>>>,
    pin: u8,
}

impl<W: Write> digital::ErrorType for BridgePin<W> {
    type Error = BridgeError;
}

impl<W: Write> OutputPin for BridgePin<W> {
    fn set_low(&mut self) -> Result<()> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<()> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<()> {
        let value = match state {
            PinState::Low => 0,
            PinState::High => 1,
        };
        with_bridge(&self.bridge, |b| b.send(self.pin, Instruction::DigitalWrite, &[value]))
    }
}

/// PWM output on the far side of the bridge
pub struct BridgePwm<W: Write = Box<dyn SerialPort>> {
    bridge: Arc<Mutex<PinBridge<W>>>,
    pin: u8,
    max_duty: u16,
}

impl<W: Write> pwm::ErrorType for BridgePwm<W> {
    type Error = BridgeError;
}

impl<W: Write> SetDutyCycle for BridgePwm<W> {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    /// Duty is sent as two bytes, little-endian
    fn set_duty_cycle(&mut self, duty: u16) -> Result<()> {
        with_bridge(&self.bridge, |b| {
            b.send(self.pin, Instruction::AnalogWrite, &duty.to_le_bytes())
        })
    }
}
