use az::SaturatingCast;
use serde::{Deserialize, Serialize};

use crate::Value;

/// Linear angle to duty calibration.
///
/// `min_duty` and `max_duty` are percentages of the PWM period, `min_deg` and
/// `max_deg` bound the calibrated angle range and `full_scale` is the duty
/// count that represents 100%.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Calibration {
    pub min_duty: Value,
    pub max_duty: Value,
    pub min_deg: Value,
    pub max_deg: Value,
    pub full_scale: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            min_duty: Value::from_num(2.5),
            max_duty: Value::from_num(12.0),
            min_deg: Value::from_num(0),
            max_deg: Value::from_num(180),
            full_scale: 65535,
        }
    }
}

impl Calibration {
    /// Converts an angle in degrees into a duty count.
    ///
    /// The duty percentage is
    /// `angle * (min_duty + max_duty) / (max_deg - min_deg) + min_duty`, scaled
    /// onto `full_scale` and floored. Angles outside `min_deg..=max_deg` are
    /// not clamped: they extrapolate along the same line, and negative
    /// results floor towards minus infinity before the final integer
    /// conversion saturates at `0` and `u32::MAX`.
    pub fn angle_to_duty(&self, angle: Value) -> u32 {
        let angle = i128::from(angle.to_bits());
        let min_duty = i128::from(self.min_duty.to_bits());
        let duty_sum = min_duty + i128::from(self.max_duty.to_bits());
        let span = i128::from(self.max_deg.to_bits()) - i128::from(self.min_deg.to_bits());
        let one = 1i128 << Value::FRAC_NBITS;

        // Percentage as an exact fraction of raw bits; a zero span falls back
        // to `min_duty`.
        let (percent_num, percent_den) = if span == 0 {
            (min_duty, one)
        } else {
            (angle * duty_sum + min_duty * span, span * one)
        };

        let mut numerator = percent_num * i128::from(self.full_scale);
        let mut denominator = percent_den * 100;
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        numerator.div_euclid(denominator).saturating_cast()
    }
}
