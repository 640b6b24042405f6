use embedded_hal::pwm::SetDutyCycle;

use crate::PwmOutput;

/// [`PwmOutput`] on top of an embedded-hal PWM channel.
///
/// The channel is already bound to its pin, so pin and channel ids are
/// ignored. `SetDutyCycle` has no way to change the carrier, so the frequency
/// passed to `configure` is ignored too: set the channel up for the servo's
/// frequency before wrapping it. Detaching drives the channel fully off;
/// writes are dropped until the output is attached again. Duty values are
/// rescaled from the configured resolution onto the channel's
/// `max_duty_cycle()`.
pub struct HalPwm<C: SetDutyCycle> {
    channel: C,
    resolution_bits: u8,
    attached: bool,
}

impl<C: SetDutyCycle> HalPwm<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            resolution_bits: 16,
            attached: false,
        }
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    fn scale(&self, duty: u32) -> u16 {
        let full = u64::MAX >> (64 - u32::from(self.resolution_bits.clamp(1, 32)));
        let max = u64::from(self.channel.max_duty_cycle());
        let scaled = u64::from(duty) * max / full;
        scaled.min(max) as u16
    }
}

impl<C: SetDutyCycle> PwmOutput for HalPwm<C> {
    fn configure(&mut self, _channel: u8, _frequency_hz: u32, resolution_bits: u8) {
        self.resolution_bits = resolution_bits;
    }

    fn attach(&mut self, _pin: u8, _channel: u8) {
        self.attached = true;
    }

    fn detach(&mut self, _pin: u8) {
        self.attached = false;
        if self.channel.set_duty_cycle_fully_off().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("failed to switch pwm output off");
        }
    }

    fn write_duty(&mut self, _channel: u8, duty: u32) {
        if !self.attached {
            return;
        }
        let duty = self.scale(duty);
        if self.channel.set_duty_cycle(duty).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("failed to set pwm duty {}", duty);
        }
    }
}
