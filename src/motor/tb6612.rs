// TB6612FNG dual H-bridge driver
//
// Each motor has two direction inputs (xIN1/xIN2) and a PWM input; a shared
// STBY line gates the output stage. The two motors face opposite ways on the
// chassis, so their direction polarity is mirrored.

use std::fmt::Debug;

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use tracing::{debug, info, warn};

use super::{speed_to_duty, Direction, MotorActuator, MotorId};

/// The seven driver inputs. `a*` pins drive the left motor, `b*` the right.
pub struct DriverPins<D, P> {
    pub ain1: D,
    pub ain2: D,
    pub bin1: D,
    pub bin2: D,
    pub standby: D,
    pub pwm_left: P,
    pub pwm_right: P,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError<DE: Debug, PE: Debug> {
    #[error("Direction/standby pin error: {0:?}")]
    Pin(DE),

    #[error("PWM output error: {0:?}")]
    Pwm(PE),
}

/// Motor actuator for a TB6612FNG
pub struct Tb6612<D: OutputPin, P: SetDutyCycle> {
    pins: DriverPins<D, P>,
}

impl<D: OutputPin, P: SetDutyCycle> Tb6612<D, P> {
    pub fn new(pins: DriverPins<D, P>) -> Self {
        Self { pins }
    }

    /// Bring the driver up: direction and standby low, duty zero, then
    /// standby released.
    ///
    /// This must be called before any direction or speed command has an effect.
    pub fn initialize(&mut self) -> Result<(), DriverError<D::Error, P::Error>> {
        info!("Initializing motor driver pins");
        let p = &mut self.pins;
        for pin in [&mut p.ain1, &mut p.ain2, &mut p.bin1, &mut p.bin2, &mut p.standby] {
            pin.set_low().map_err(DriverError::Pin)?;
        }
        for pwm in [&mut p.pwm_left, &mut p.pwm_right] {
            pwm.set_duty_cycle_fully_off().map_err(DriverError::Pwm)?;
        }
        self.enable(true);
        info!("Motor driver enabled");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pins(&self) -> &DriverPins<D, P> {
        &self.pins
    }
}

fn write_state<D: OutputPin>(pin: &mut D, state: PinState) {
    if let Err(e) = pin.set_state(state) {
        warn!("Failed to drive pin {:?}: {:?}", state, e);
    }
}

// The low side is released before the other one is raised, so the bridge
// never sees both inputs high (short brake) mid-switch.
fn switch_pair<D: OutputPin>(low: &mut D, high: &mut D) {
    write_state(low, PinState::Low);
    write_state(high, PinState::High);
}

fn write_duty<P: SetDutyCycle>(pwm: &mut P, speed: u8) {
    let duty = speed_to_duty(speed, pwm.max_duty_cycle());
    if let Err(e) = pwm.set_duty_cycle(duty) {
        warn!("Failed to set duty {}: {:?}", duty, e);
    }
}

impl<D: OutputPin, P: SetDutyCycle> MotorActuator for Tb6612<D, P> {
    fn enable(&mut self, on: bool) {
        let state = PinState::from(on);
        debug!("Standby line {:?}", state);
        write_state(&mut self.pins.standby, state);
    }

    fn set_direction(&mut self, motor: MotorId, direction: Direction) {
        let p = &mut self.pins;
        match (motor, direction) {
            (MotorId::Left, Direction::Forward) => switch_pair(&mut p.ain1, &mut p.ain2),
            (MotorId::Left, Direction::Reverse) => switch_pair(&mut p.ain2, &mut p.ain1),
            (MotorId::Right, Direction::Forward) => switch_pair(&mut p.bin2, &mut p.bin1),
            (MotorId::Right, Direction::Reverse) => switch_pair(&mut p.bin1, &mut p.bin2),
            (MotorId::Both, _) => {
                for pin in [&mut p.ain1, &mut p.ain2, &mut p.bin1, &mut p.bin2] {
                    write_state(pin, PinState::Low);
                }
            }
        }
    }

    fn set_speed(&mut self, motor: MotorId, speed: u8) {
        match motor {
            MotorId::Left => write_duty(&mut self.pins.pwm_left, speed),
            MotorId::Right => write_duty(&mut self.pins.pwm_right, speed),
            MotorId::Both => {
                write_duty(&mut self.pins.pwm_left, 0);
                write_duty(&mut self.pins.pwm_right, 0);
            }
        }
    }
}

impl<D: OutputPin, P: SetDutyCycle> Drop for Tb6612<D, P> {
    fn drop(&mut self) {
        // Leave the motors stopped when the runtime goes away
        info!("Stopping all motors");
        self.set_speed(MotorId::Both, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinMap;
    use crate::motor::mock::{Journal, MockPin, MockPwm, PinOp};

    fn driver() -> Tb6612<MockPin, MockPwm> {
        Tb6612::new(DriverPins::simulated(&PinMap::XENON, 255))
    }

    fn journaled() -> (Tb6612<MockPin, MockPwm>, Journal) {
        let journal = Journal::default();
        let pins = DriverPins::journaled(&PinMap::XENON, 255, &journal);
        (Tb6612::new(pins), journal)
    }

    #[test]
    fn test_initialize_drives_everything_low_then_enables() {
        let (mut motors, journal) = journaled();
        motors.initialize().unwrap();

        let ops = journal.ops();
        assert_eq!(ops.len(), 5 + 2 + 1);
        for op in &ops[..5] {
            assert!(matches!(op, PinOp::Digital(_, PinState::Low)), "{:?}", op);
        }
        assert_eq!(ops[5], PinOp::Duty(2, 0));
        assert_eq!(ops[6], PinOp::Duty(8, 0));
        assert_eq!(ops.last(), Some(&PinOp::Digital(5, PinState::High)));
        assert_eq!(motors.pins().standby.state(), PinState::High);
    }

    #[test]
    fn test_left_polarity() {
        let mut motors = driver();
        motors.set_direction(MotorId::Left, Direction::Forward);
        assert_eq!(motors.pins().ain1.state(), PinState::Low);
        assert_eq!(motors.pins().ain2.state(), PinState::High);

        motors.set_direction(MotorId::Left, Direction::Reverse);
        assert_eq!(motors.pins().ain1.state(), PinState::High);
        assert_eq!(motors.pins().ain2.state(), PinState::Low);
    }

    #[test]
    fn test_right_polarity_is_mirrored() {
        let mut motors = driver();
        motors.set_direction(MotorId::Right, Direction::Forward);
        assert_eq!(motors.pins().bin1.state(), PinState::High);
        assert_eq!(motors.pins().bin2.state(), PinState::Low);

        motors.set_direction(MotorId::Right, Direction::Reverse);
        assert_eq!(motors.pins().bin1.state(), PinState::Low);
        assert_eq!(motors.pins().bin2.state(), PinState::High);
    }

    #[test]
    fn test_low_side_written_first() {
        let (mut motors, journal) = journaled();
        motors.set_direction(MotorId::Left, Direction::Reverse);
        assert_eq!(
            journal.ops(),
            [PinOp::Digital(7, PinState::Low), PinOp::Digital(6, PinState::High)]
        );
    }

    #[test]
    fn test_both_releases_all_direction_pins() {
        let mut motors = driver();
        motors.set_direction(MotorId::Left, Direction::Forward);
        motors.set_direction(MotorId::Right, Direction::Forward);
        motors.set_direction(MotorId::Both, Direction::Forward);
        let p = motors.pins();
        for pin in [&p.ain1, &p.ain2, &p.bin1, &p.bin2] {
            assert_eq!(pin.state(), PinState::Low);
        }
    }

    #[test]
    fn test_speed_maps_to_duty() {
        let mut motors = driver();
        motors.set_speed(MotorId::Left, 40);
        motors.set_speed(MotorId::Right, 100);
        assert_eq!(motors.pins().pwm_left.duty(), 102);
        assert_eq!(motors.pins().pwm_right.duty(), 255);

        motors.set_speed(MotorId::Both, 100);
        assert_eq!(motors.pins().pwm_left.duty(), 0);
        assert_eq!(motors.pins().pwm_right.duty(), 0);
    }

    #[test]
    fn test_duty_follows_pwm_range() {
        let mut motors = Tb6612::new(DriverPins::simulated(&PinMap::XENON, 1000));
        motors.set_speed(MotorId::Left, 50);
        assert_eq!(motors.pins().pwm_left.duty(), 500);
    }

    #[test]
    fn test_enable_toggles_standby() {
        let mut motors = driver();
        motors.enable(true);
        assert_eq!(motors.pins().standby.state(), PinState::High);
        motors.enable(false);
        assert_eq!(motors.pins().standby.state(), PinState::Low);
    }

    #[test]
    fn test_drop_zeroes_duty() {
        let journal = Journal::default();
        {
            let mut motors = Tb6612::new(DriverPins::journaled(&PinMap::XENON, 255, &journal));
            motors.set_speed(MotorId::Left, 100);
        }
        assert_eq!(
            journal.ops()[1..],
            [PinOp::Duty(2, 0), PinOp::Duty(8, 0)]
        );
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut motors = Tb6612::new(DriverPins::failing(&PinMap::XENON, 255));
        motors.set_direction(MotorId::Left, Direction::Forward);
        motors.set_speed(MotorId::Left, 100);
        motors.enable(true);
        assert_eq!(motors.pins().ain2.state(), PinState::Low);
        assert_eq!(motors.pins().pwm_left.duty(), 0);
        assert!(matches!(motors.initialize(), Err(DriverError::Pin(_))));
    }
}
