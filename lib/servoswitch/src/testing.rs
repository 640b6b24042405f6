use std::vec::Vec;

use crate::{PwmOutput, ServoSwitchConfig, Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PwmEvent {
    Configure {
        channel: u8,
        frequency_hz: u32,
        resolution_bits: u8,
    },
    Attach {
        pin: u8,
        channel: u8,
    },
    Detach {
        pin: u8,
    },
    Write {
        channel: u8,
        duty: u32,
    },
}

pub struct FakePwm {
    pub events: Vec<PwmEvent>,
    pub attached: bool,
}

impl FakePwm {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            attached: false,
        }
    }

    pub fn writes(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                PwmEvent::Write { duty, .. } => Some(*duty),
                _ => None,
            })
            .collect()
    }
}

impl PwmOutput for FakePwm {
    fn configure(&mut self, channel: u8, frequency_hz: u32, resolution_bits: u8) {
        self.events.push(PwmEvent::Configure {
            channel,
            frequency_hz,
            resolution_bits,
        });
    }

    fn attach(&mut self, pin: u8, channel: u8) {
        self.attached = true;
        self.events.push(PwmEvent::Attach { pin, channel });
    }

    fn detach(&mut self, pin: u8) {
        self.attached = false;
        self.events.push(PwmEvent::Detach { pin });
    }

    fn write_duty(&mut self, channel: u8, duty: u32) {
        self.events.push(PwmEvent::Write { channel, duty });
    }
}

/// Step of 5 degrees with a 10 tick settle delay.
pub fn test_config() -> ServoSwitchConfig {
    ServoSwitchConfig {
        suspend_delay_ticks: 10,
        step_deg: Value::from_num(5),
        ..Default::default()
    }
}
