pub mod poses;

pub use poses::{HandPose, PRESETS};
