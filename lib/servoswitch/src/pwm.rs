/// Hardware PWM peripheral driving a single servo output.
///
/// Calls are infallible from the switch's point of view; implementations
/// report or swallow hardware errors themselves.
pub trait PwmOutput {
    fn configure(&mut self, channel: u8, frequency_hz: u32, resolution_bits: u8);
    fn attach(&mut self, pin: u8, channel: u8);
    fn detach(&mut self, pin: u8);
    fn write_duty(&mut self, channel: u8, duty: u32);
}

impl<P: PwmOutput + ?Sized> PwmOutput for &mut P {
    fn configure(&mut self, channel: u8, frequency_hz: u32, resolution_bits: u8) {
        (**self).configure(channel, frequency_hz, resolution_bits)
    }

    fn attach(&mut self, pin: u8, channel: u8) {
        (**self).attach(pin, channel)
    }

    fn detach(&mut self, pin: u8) {
        (**self).detach(pin)
    }

    fn write_duty(&mut self, channel: u8, duty: u32) {
        (**self).write_duty(channel, duty)
    }
}
