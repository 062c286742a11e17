// Control word decoder
//
// The remote packs two input domains into one integer: the four buttons in
// bits 0-3 and the joystick in bits 4-7, both ordered UP, DOWN, LEFT, RIGHT.
// The joystick is folded onto the buttons, so either one alone (or both
// together) means the same thing.
//
// Decoding walks an ordered rule table. Every rule whose pattern matches
// fires, and a later rule overwrites the directions and speed of an earlier
// one. Multi-button inputs therefore resolve by table order:
//
//   UP+LEFT+RIGHT        -> forward, both motors at turn speed
//   UP+DOWN+LEFT         -> reverse (DOWN+LEFT fires last), left at turn speed
//   UP+DOWN+LEFT+RIGHT   -> reverse, both at turn speed
//   UP+DOWN, LEFT+RIGHT  -> no rule fires; directions stay latched, full speed

use tracing::{debug, info};

use crate::motor::{Direction, MotorActuator, MotorId};
use crate::motor::Direction::{Forward, Reverse};

/// Speed for straight runs and pivots
pub const CRUISE_SPEED: u8 = 100;

/// Speed of the inner motor on a soft turn
pub const TURN_SPEED: u8 = 40;

/// Folded control word: UP, DOWN, LEFT, RIGHT in bits 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlWord(u8);

impl ControlWord {
    pub const UP: ControlWord = ControlWord(0x01);
    pub const DOWN: ControlWord = ControlWord(0x02);
    pub const LEFT: ControlWord = ControlWord(0x04);
    pub const RIGHT: ControlWord = ControlWord(0x08);

    const BUTTON_MASK: i32 = 0x0F;
    const JOYSTICK_MASK: i32 = 0xF0;

    /// Fold the joystick bits onto the button bits. Anything above bit 7 is
    /// dropped.
    pub fn fold(raw: i32) -> Self {
        let folded = ((raw & Self::JOYSTICK_MASK) >> 4) | (raw & Self::BUTTON_MASK);
        ControlWord(folded as u8)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every bit of `other` is set
    pub fn contains(self, other: ControlWord) -> bool {
        self.0 & other.0 == other.0
    }
}

/// How a rule's pattern is compared to the folded word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// The word is exactly the pattern
    Exactly,
    /// The word has at least the pattern's bits, extra bits ignored
    AllOf,
}

/// One row of the decode table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: ControlWord,
    pub matching: Match,
    pub left: Direction,
    pub right: Direction,
    /// Motor dropped to [`TURN_SPEED`], if any
    pub slow: Option<MotorId>,
}

impl Rule {
    pub fn matches(&self, word: ControlWord) -> bool {
        match self.matching {
            Match::Exactly => word == self.pattern,
            Match::AllOf => word.contains(self.pattern),
        }
    }
}

const fn rule(
    name: &'static str,
    pattern: ControlWord,
    matching: Match,
    left: Direction,
    right: Direction,
    slow: Option<MotorId>,
) -> Rule {
    Rule {
        name,
        pattern,
        matching,
        left,
        right,
        slow,
    }
}

const UP_LEFT: ControlWord = ControlWord(0x05);
const UP_RIGHT: ControlWord = ControlWord(0x09);
const DOWN_LEFT: ControlWord = ControlWord(0x06);
const DOWN_RIGHT: ControlWord = ControlWord(0x0A);

/// Decode table, in evaluation order. Later matches win.
pub const RULES: [Rule; 8] = [
    rule("Forward", ControlWord::UP, Match::Exactly, Forward, Forward, None),
    rule("Reverse", ControlWord::DOWN, Match::Exactly, Reverse, Reverse, None),
    rule("Left", ControlWord::LEFT, Match::Exactly, Forward, Reverse, None),
    rule("Right", ControlWord::RIGHT, Match::Exactly, Reverse, Forward, None),
    rule("Forward + Left", UP_LEFT, Match::AllOf, Forward, Forward, Some(MotorId::Left)),
    rule("Forward + Right", UP_RIGHT, Match::AllOf, Forward, Forward, Some(MotorId::Right)),
    rule("Reverse + Left", DOWN_LEFT, Match::AllOf, Reverse, Reverse, Some(MotorId::Left)),
    rule("Reverse + Right", DOWN_RIGHT, Match::AllOf, Reverse, Reverse, Some(MotorId::Right)),
];

/// What one motor should do after a decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorDrive {
    /// None leaves the direction the hardware already has
    pub direction: Option<Direction>,
    pub speed: u8,
}

/// Result of decoding one control word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drive {
    pub buttons: ControlWord,
    pub left: MotorDrive,
    pub right: MotorDrive,
}

impl Drive {
    /// Issue the drive to the motors: direction first, then speed, left then right
    pub fn apply<A: MotorActuator + ?Sized>(&self, motors: &mut A) {
        for (id, motor) in [(MotorId::Left, self.left), (MotorId::Right, self.right)] {
            if let Some(direction) = motor.direction {
                motors.set_direction(id, direction);
            }
            motors.set_speed(id, motor.speed);
        }
    }
}

/// Decode a raw control word into a drive intent
pub fn decode(raw: i32) -> Drive {
    let buttons = ControlWord::fold(raw);

    let mut left = MotorDrive {
        direction: None,
        speed: CRUISE_SPEED,
    };
    let mut right = left;

    for rule in RULES.iter().filter(|r| r.matches(buttons)) {
        info!("{}", rule.name);
        left.direction = Some(rule.left);
        right.direction = Some(rule.right);
        match rule.slow {
            Some(MotorId::Left) => left.speed = TURN_SPEED,
            Some(MotorId::Right) => right.speed = TURN_SPEED,
            _ => {}
        }
    }

    if buttons.is_empty() {
        info!("Stop");
        left.speed = 0;
        right.speed = 0;
    }

    debug!("Decoded 0x{:04X} -> {:?} L={:?} R={:?}", raw, buttons, left, right);
    Drive {
        buttons,
        left,
        right,
    }
}
