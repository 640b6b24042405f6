#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt::Display;
use fixed::{types::extra::U16, FixedI32, FixedI64};

mod config;
mod duty;
mod hal;
mod pwm;
mod runner;
mod switch;
#[cfg(test)]
mod testing;

pub use config::ServoSwitchConfig;
pub use duty::Calibration;
pub use hal::HalPwm;
pub use pwm::PwmOutput;
pub use runner::{ServoSwitchChannel, ServoSwitchClient, SwitchStatus};
pub use switch::{ServoSwitch, SwitchState};

pub type Value = FixedI32<U16>;
pub type Value64 = FixedI64<U16>;

#[derive(Debug)]
pub enum Error {
    InvalidStep,
    InvalidCalibration,
    InvalidResolution(u8),
    FullScaleOutOfRange(u32),
    InvalidCommandResponse,
}

pub type Result<T> = core::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidStep => write!(f, "step must be positive"),
            Self::InvalidCalibration => write!(f, "calibration angle range is empty"),
            Self::InvalidResolution(bits) => write!(f, "unsupported duty resolution {} bits", bits),
            Self::FullScaleOutOfRange(full_scale) => {
                write!(f, "full scale duty {} exceeds resolution", full_scale)
            }
            Self::InvalidCommandResponse => write!(f, "invalid command response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::string::ToString;

    use super::*;

    #[test]
    fn errors_display() {
        assert_eq!(Error::InvalidStep.to_string(), "step must be positive");
        assert_eq!(
            Error::InvalidResolution(40).to_string(),
            "unsupported duty resolution 40 bits"
        );
        assert_eq!(
            Error::FullScaleOutOfRange(70000).to_string(),
            "full scale duty 70000 exceeds resolution"
        );
    }
}
