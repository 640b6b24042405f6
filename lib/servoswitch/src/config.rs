use serde::{Deserialize, Serialize};

use crate::{duty::Calibration, Error, Result, Value};

/// Tunables shared by every switch built from this config.
///
/// Timing is expressed in ticks, one per call to `ServoSwitch::update`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ServoSwitchConfig {
    pub pwm_hz: u32,
    pub duty_resolution_bits: u8,
    pub suspend_delay_ticks: u32,
    pub step_deg: Value,
    pub calibration: Calibration,
}

impl Default for ServoSwitchConfig {
    fn default() -> Self {
        Self {
            pwm_hz: 50,
            duty_resolution_bits: 16,
            suspend_delay_ticks: 50,
            step_deg: Value::from_num(5),
            calibration: Calibration::default(),
        }
    }
}

impl ServoSwitchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step_deg <= 0 {
            return Err(Error::InvalidStep);
        }
        if self.calibration.max_deg <= self.calibration.min_deg {
            return Err(Error::InvalidCalibration);
        }
        if !(1..=32).contains(&self.duty_resolution_bits) {
            return Err(Error::InvalidResolution(self.duty_resolution_bits));
        }

        let max_duty = u32::MAX >> (32 - u32::from(self.duty_resolution_bits));
        if self.calibration.full_scale > max_duty {
            return Err(Error::FullScaleOutOfRange(self.calibration.full_scale));
        }

        Ok(())
    }
}
