use serde::{Deserialize, Serialize};

use crate::serial::protocol::{Command, FingerJoints, ThumbJoints};

/// Actuator values for all five digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandPose {
    pub thumb: ThumbJoints,
    pub index: FingerJoints,
    pub middle: FingerJoints,
    pub ring: FingerJoints,
    pub pinky: FingerJoints,
}

// Calibrated positions; FingerJoints order is proximal, medial, distal, lateral.
const EXTENDED: HandPose = HandPose {
    thumb: ThumbJoints::new(270, 270, 400),
    index: FingerJoints::new(300, 300, 280, 305),
    middle: FingerJoints::new(290, 300, 290, 310),
    ring: FingerJoints::new(290, 300, 280, 305),
    pinky: FingerJoints::new(290, 290, 280, 310),
};

const SPREAD: HandPose = HandPose {
    thumb: ThumbJoints::new(270, 270, 400),
    index: FingerJoints::new(300, 300, 280, 325),
    middle: FingerJoints::new(290, 300, 290, 320),
    ring: FingerJoints::new(290, 300, 280, 280),
    pinky: FingerJoints::new(290, 290, 280, 250),
};

const FIST: HandPose = HandPose {
    thumb: ThumbJoints::new(270, 270, 260),
    index: FingerJoints::new(370, 180, 380, 305),
    middle: FingerJoints::new(200, 380, 220, 310),
    ring: FingerJoints::new(200, 190, 380, 305),
    pinky: FingerJoints::new(380, 200, 380, 310),
};

// Servo sweep limits
const OPEN: HandPose = HandPose::uniform(250);
const CLOSED: HandPose = HandPose::uniform(400);

pub const PRESETS: &[(&str, HandPose)] = &[
    ("extended", EXTENDED),
    ("spread", SPREAD),
    ("fist", FIST),
    ("open", OPEN),
    ("closed", CLOSED),
];

impl HandPose {
    /// Every joint on every digit set to `value`
    pub const fn uniform(value: i32) -> Self {
        Self {
            thumb: ThumbJoints::uniform(value),
            index: FingerJoints::uniform(value),
            middle: FingerJoints::uniform(value),
            ring: FingerJoints::uniform(value),
            pinky: FingerJoints::uniform(value),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, pose)| *pose)
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, _)| *name)
    }

    /// The pose as wire commands, in tag order
    pub fn commands(&self) -> [Command; 3] {
        [
            Command::IndexMiddle {
                index: self.index,
                middle: self.middle,
            },
            Command::RingPinky {
                ring: self.ring,
                pinky: self.pinky,
            },
            Command::Thumb(self.thumb),
        ]
    }
}
