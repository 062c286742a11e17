// Message types for the runtime

use serde::{Deserialize, Serialize};

use crate::control::Drive;
use crate::motor::Direction;

/// Parse a control word payload the way the remote expects: skip leading
/// whitespace, take an optional sign and as many digits as follow.
/// Anything unparseable reads as 0 (no buttons held); out-of-range values
/// saturate at `i32::MIN`/`i32::MAX`.
pub fn parse_control_word(payload: &str) -> i32 {
    // C `isspace`: space, \t, \n, \v, \f, \r; nothing outside ASCII
    let text = payload.trim_start_matches([' ', '\t', '\n', '\x0B', '\x0C', '\r']);
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let saturated = if negative { i32::MIN } else { i32::MAX };
    let mut value: i32 = 0;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = (d - b'0') as i32;
        // Accumulate toward the sign so i32::MIN itself is reachable
        let next = value.checked_mul(10).and_then(|v| {
            if negative {
                v.checked_sub(digit)
            } else {
                v.checked_add(digit)
            }
        });
        match next {
            Some(v) => value = v,
            None => return saturated,
        }
    }
    value
}

/// Per-motor part of a drive report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotorReport {
    // None when the decode left the previous direction latched
    pub direction: Option<Direction>,
    pub speed: u8,
}

// Actuation output from runtime -> observers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveReport {
    pub raw: i32,
    pub buttons: u8,
    pub left: MotorReport,
    pub right: MotorReport,
}

impl DriveReport {
    pub fn new(raw: i32, drive: &Drive) -> Self {
        Self {
            raw,
            buttons: drive.buttons.bits(),
            left: MotorReport {
                direction: drive.left.direction,
                speed: drive.left.speed,
            },
            right: MotorReport {
                direction: drive.right.direction,
                speed: drive.right.speed,
            },
        }
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Idle,
    Ok,
    CmdStale,
}
