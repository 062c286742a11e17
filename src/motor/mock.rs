// In-memory stand-ins for the motor hardware
//
// MockPin and MockPwm keep only their last state, so a --sim session runs in
// constant memory. Tests can hand them a shared Journal to see every write in
// order across pins.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin, PinState};
use embedded_hal::pwm::{self, SetDutyCycle};
use tracing::debug;

use super::tb6612::DriverPins;
use crate::config::PinMap;

/// One write seen by a journaled pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOp {
    Digital(u8, PinState),
    Duty(u8, u16),
}

/// Write log shared by a set of pins
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<PinOp>>>);

impl Journal {
    fn record(&self, op: PinOp) {
        self.0.borrow_mut().push(op);
    }

    #[cfg(test)]
    pub(crate) fn ops(&self) -> Vec<PinOp> {
        self.0.borrow().clone()
    }
}

/// Digital output that remembers its level
#[derive(Debug)]
pub struct MockPin {
    id: u8,
    state: PinState,
    journal: Option<Journal>,
    fail: bool,
}

impl MockPin {
    fn new(id: u8, journal: Option<Journal>, fail: bool) -> Self {
        Self {
            id,
            state: PinState::Low,
            journal,
            fail,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PinState {
        self.state
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        debug!("pin {} -> {:?}", self.id, state);
        self.state = state;
        if let Some(journal) = &self.journal {
            journal.record(PinOp::Digital(self.id, state));
        }
        Ok(())
    }
}

/// PWM output that remembers its duty
#[derive(Debug)]
pub struct MockPwm {
    id: u8,
    duty: u16,
    max_duty: u16,
    journal: Option<Journal>,
    fail: bool,
}

impl MockPwm {
    fn new(id: u8, max_duty: u16, journal: Option<Journal>, fail: bool) -> Self {
        Self {
            id,
            duty: 0,
            max_duty,
            journal,
            fail,
        }
    }

    #[cfg(test)]
    pub(crate) fn duty(&self) -> u16 {
        self.duty
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail {
            return Err(pwm::ErrorKind::Other);
        }
        debug!("pin {} duty {}", self.id, duty);
        self.duty = duty;
        if let Some(journal) = &self.journal {
            journal.record(PinOp::Duty(self.id, duty));
        }
        Ok(())
    }
}

impl DriverPins<MockPin, MockPwm> {
    /// In-memory pins laid out like `map`
    pub fn simulated(map: &PinMap, max_duty: u16) -> Self {
        Self::mock(map, max_duty, None, false)
    }

    #[cfg(test)]
    pub(crate) fn journaled(map: &PinMap, max_duty: u16, journal: &Journal) -> Self {
        Self::mock(map, max_duty, Some(journal.clone()), false)
    }

    /// Pins on which every write fails
    #[cfg(test)]
    pub(crate) fn failing(map: &PinMap, max_duty: u16) -> Self {
        Self::mock(map, max_duty, None, true)
    }

    fn mock(map: &PinMap, max_duty: u16, journal: Option<Journal>, fail: bool) -> Self {
        let pin = |id| MockPin::new(id, journal.clone(), fail);
        let pwm = |id| MockPwm::new(id, max_duty, journal.clone(), fail);
        Self {
            ain1: pin(map.ain1),
            ain2: pin(map.ain2),
            bin1: pin(map.bin1),
            bin2: pin(map.bin2),
            standby: pin(map.standby),
            pwm_left: pwm(map.pwm_left),
            pwm_right: pwm(map.pwm_right),
        }
    }
}

#[cfg(test)]
pub(crate) use recording::{ActuatorCall, RecordingActuator};
