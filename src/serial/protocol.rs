use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use super::{Result, TransportError};

pub const TAG_INDEX_MIDDLE: u8 = 1;
pub const TAG_RING_PINKY: u8 = 2;
pub const TAG_THUMB: u8 = 3;

/// Actuator values for one four-joint finger (digits 02 through 05)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerJoints {
    pub proximal: i32,
    pub medial: i32,
    pub distal: i32,
    pub lateral: i32,
}

impl FingerJoints {
    pub const fn new(proximal: i32, medial: i32, distal: i32, lateral: i32) -> Self {
        Self {
            proximal,
            medial,
            distal,
            lateral,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    fn fields(&self) -> [i32; 4] {
        [self.proximal, self.medial, self.distal, self.lateral]
    }
}

/// Actuator values for the thumb (digit 01), which has no medial joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbJoints {
    pub proximal: i32,
    pub distal: i32,
    pub lateral: i32,
}

impl ThumbJoints {
    pub const fn new(proximal: i32, distal: i32, lateral: i32) -> Self {
        Self {
            proximal,
            distal,
            lateral,
        }
    }

    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value)
    }
}

/// One line of the actuator protocol.
///
/// Rendered as `<tag>,<field>,...\n`. The firmware parses fields by position,
/// so the field order within each variant is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Tag 1: index (02) then middle (03)
    IndexMiddle { index: FingerJoints, middle: FingerJoints },
    /// Tag 2: ring (04) then pinky (05)
    RingPinky { ring: FingerJoints, pinky: FingerJoints },
    /// Tag 3: thumb (01)
    Thumb(ThumbJoints),
}

impl Command {
    pub fn tag(&self) -> u8 {
        match self {
            Command::IndexMiddle { .. } => TAG_INDEX_MIDDLE,
            Command::RingPinky { .. } => TAG_RING_PINKY,
            Command::Thumb(_) => TAG_THUMB,
        }
    }

    /// Field values in wire order, without the tag
    pub fn fields(&self) -> Vec<i32> {
        match self {
            Command::IndexMiddle { index: first, middle: second }
            | Command::RingPinky { ring: first, pinky: second } => {
                let mut fields = Vec::with_capacity(8);
                fields.extend_from_slice(&first.fields());
                fields.extend_from_slice(&second.fields());
                fields
            }
            Command::Thumb(thumb) => vec![thumb.proximal, thumb.distal, thumb.lateral],
        }
    }

    /// Reject values the firmware cannot represent
    pub fn validate(&self) -> Result<()> {
        if let Some((pos, value)) = self.fields().into_iter().enumerate().find(|(_, v)| *v < 0) {
            return Err(TransportError::InvalidCommand(format!(
                "field {} of command {} is negative: {}",
                pos + 1,
                self.tag(),
                value
            )));
        }
        Ok(())
    }

    /// Newline-terminated wire line
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    fn arity(tag: u8) -> Option<usize> {
        match tag {
            TAG_INDEX_MIDDLE | TAG_RING_PINKY => Some(8),
            TAG_THUMB => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())?;
        for value in self.fields() {
            write!(f, ",{}", value)?;
        }
        Ok(())
    }
}

impl FromStr for Command {
    type Err = TransportError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        let parts: Vec<&str> = line.split(',').collect();
        let tag: u8 = parse_number(parts[0], "tag")?;
        let arity = Command::arity(tag)
            .ok_or_else(|| TransportError::InvalidCommand(format!("unknown tag: {}", tag)))?;

        if parts.len() - 1 != arity {
            return Err(TransportError::InvalidCommand(format!(
                "command {} takes {} fields, got {}",
                tag,
                arity,
                parts.len() - 1
            )));
        }

        let mut v = Vec::with_capacity(arity);
        for part in &parts[1..] {
            v.push(parse_number::<i32>(part, "field")?);
        }

        let command = match tag {
            TAG_INDEX_MIDDLE => Command::IndexMiddle {
                index: FingerJoints::new(v[0], v[1], v[2], v[3]),
                middle: FingerJoints::new(v[4], v[5], v[6], v[7]),
            },
            TAG_RING_PINKY => Command::RingPinky {
                ring: FingerJoints::new(v[0], v[1], v[2], v[3]),
                pinky: FingerJoints::new(v[4], v[5], v[6], v[7]),
            },
            _ => Command::Thumb(ThumbJoints::new(v[0], v[1], v[2])),
        };
        command.validate()?;
        Ok(command)
    }
}

// Plain decimal as the firmware prints it: no sign, no leading zeros.
fn parse_number<T: FromStr>(text: &str, what: &str) -> Result<T> {
    let canonical = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));
    let invalid = || TransportError::InvalidCommand(format!("invalid {}: {:?}", what, text));
    if !canonical {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}
