// Remote-control decoding
//
// Turns the raw control word from the remote into a per-motor drive intent.

mod decoder;

pub use decoder::{decode, ControlWord, Drive, Match, MotorDrive, Rule, CRUISE_SPEED, RULES, TURN_SPEED};
