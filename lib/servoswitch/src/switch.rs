use crate::{PwmOutput, Result, ServoSwitchConfig, Value, Value64};

/// Where a switch is in its move/settle/suspend cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchState {
    /// The simulated angle has not reached the target yet.
    Driving,
    /// At the target, counting down ticks before the output may be detached.
    Settling { ticks_left: u32 },
    /// Output detached from the pin.
    Suspended,
}

/// What the output stage does on a tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Output {
    Drive,
    /// Suspended, but motion was seen this tick: reattach and drive.
    Resume,
    Suspend,
    Hold,
}

#[derive(Debug, Eq, PartialEq)]
struct Transition {
    next: SwitchState,
    output: Output,
}

impl SwitchState {
    fn time_to_suspend(self, delay: u32) -> u32 {
        match self {
            Self::Driving => delay,
            Self::Settling { ticks_left } => ticks_left,
            Self::Suspended => 0,
        }
    }

    /// `moving` is whether the angle differed from the target at the start of
    /// the tick.
    fn tick(self, moving: bool, suspend_enabled: bool, delay: u32) -> Transition {
        let time_to_suspend = if moving {
            delay
        } else {
            self.time_to_suspend(delay).saturating_sub(1)
        };
        let active = if moving {
            Self::Driving
        } else {
            Self::Settling {
                ticks_left: time_to_suspend,
            }
        };

        if !suspend_enabled {
            let next = if self == Self::Suspended {
                Self::Suspended
            } else {
                active
            };
            return Transition {
                next,
                output: Output::Drive,
            };
        }

        match (self, time_to_suspend) {
            (Self::Suspended, 0) => Transition {
                next: Self::Suspended,
                output: Output::Hold,
            },
            (Self::Suspended, _) => Transition {
                next: active,
                output: Output::Resume,
            },
            (_, 0) => Transition {
                next: Self::Suspended,
                output: Output::Suspend,
            },
            _ => Transition {
                next: active,
                output: Output::Drive,
            },
        }
    }
}

/// A servo that flips between an "off" and an "on" angle.
///
/// The switch owns its PWM output and has no timer of its own: call
/// [`ServoSwitch::update`] once per control tick. Motion is simulated, the
/// angle moves one `step_deg` per tick towards the target. With suspension
/// enabled the output is detached once the servo has been still for
/// `suspend_delay_ticks` ticks and reattached as soon as it has to move again.
///
/// Dropping the switch detaches the output.
pub struct ServoSwitch<P: PwmOutput> {
    pwm: P,
    pin: u8,
    channel: u8,
    switch_off_deg: Value,
    switch_on_deg: Value,
    switch_mid_deg: Value,
    target_deg: Value,
    current_deg: Value,
    suspend_enabled: bool,
    state: SwitchState,
    config: ServoSwitchConfig,
}

impl<P: PwmOutput> ServoSwitch<P> {
    pub fn new(
        pwm: P,
        pin: u8,
        channel: u8,
        switch_off_deg: Value,
        switch_on_deg: Value,
        suspend_enabled: bool,
    ) -> Self {
        Self::build(
            pwm,
            pin,
            channel,
            switch_off_deg,
            switch_on_deg,
            suspend_enabled,
            ServoSwitchConfig::default(),
        )
    }

    pub fn with_config(
        pwm: P,
        pin: u8,
        channel: u8,
        switch_off_deg: Value,
        switch_on_deg: Value,
        suspend_enabled: bool,
        config: ServoSwitchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            pwm,
            pin,
            channel,
            switch_off_deg,
            switch_on_deg,
            suspend_enabled,
            config,
        ))
    }

    fn build(
        mut pwm: P,
        pin: u8,
        channel: u8,
        switch_off_deg: Value,
        switch_on_deg: Value,
        suspend_enabled: bool,
        config: ServoSwitchConfig,
    ) -> Self {
        pwm.configure(channel, config.pwm_hz, config.duty_resolution_bits);
        pwm.attach(pin, channel);

        let switch_mid_deg =
            Value::from_num((Value64::from(switch_off_deg) + Value64::from(switch_on_deg)) / 2);

        Self {
            pwm,
            pin,
            channel,
            switch_off_deg,
            switch_on_deg,
            switch_mid_deg,
            target_deg: switch_off_deg,
            current_deg: switch_off_deg,
            suspend_enabled,
            state: SwitchState::Settling {
                ticks_left: config.suspend_delay_ticks,
            },
            config,
        }
    }

    pub fn on(&mut self) {
        self.target_deg = self.switch_on_deg;
    }

    pub fn off(&mut self) {
        self.target_deg = self.switch_off_deg;
    }

    /// At or below the midpoint angle the switch heads for "on", above it
    /// for "off". The decision uses the simulated angle, not the last target,
    /// so toggling twice during a move does not reverse it. The comparison is
    /// numeric whatever the endpoint order.
    pub fn toggle(&mut self) {
        self.target_deg = if self.current_deg <= self.switch_mid_deg {
            self.switch_on_deg
        } else {
            self.switch_off_deg
        };
    }

    pub fn suspend(&mut self) {
        if self.state != SwitchState::Suspended {
            self.pwm.detach(self.pin);
            #[cfg(feature = "defmt")]
            defmt::debug!("servo pin {}: output detached", self.pin);
        }
        self.state = SwitchState::Suspended;
    }

    pub fn resume(&mut self) {
        if self.state == SwitchState::Suspended {
            self.pwm.attach(self.pin, self.channel);
            #[cfg(feature = "defmt")]
            defmt::debug!("servo pin {}: output attached", self.pin);

            self.state = if self.current_deg == self.target_deg {
                SwitchState::Settling {
                    ticks_left: self.config.suspend_delay_ticks,
                }
            } else {
                SwitchState::Driving
            };
        }
    }

    /// Advances the switch by one tick.
    pub fn update(&mut self) {
        let moving = self.current_deg != self.target_deg;
        let transition = self.state.tick(
            moving,
            self.suspend_enabled,
            self.config.suspend_delay_ticks,
        );

        self.step();

        match transition.output {
            Output::Drive => self.write_duty(),
            Output::Resume => {
                self.resume();
                self.write_duty();
            }
            Output::Suspend => self.suspend(),
            Output::Hold => {}
        }
        self.state = transition.next;
    }

    fn step(&mut self) {
        let step = self.config.step_deg;
        if self.current_deg < self.target_deg {
            self.current_deg = self.current_deg.saturating_add(step).min(self.target_deg);
        } else if self.current_deg > self.target_deg {
            self.current_deg = self.current_deg.saturating_sub(step).max(self.target_deg);
        }
    }

    fn write_duty(&mut self) {
        let duty = self.config.calibration.angle_to_duty(self.current_deg);
        self.pwm.write_duty(self.channel, duty);
    }

    pub fn is_state_on(&self) -> bool {
        self.current_deg == self.switch_on_deg
    }

    pub fn is_state_off(&self) -> bool {
        self.current_deg == self.switch_off_deg
    }

    pub fn is_suspended(&self) -> bool {
        self.state == SwitchState::Suspended
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn current_deg(&self) -> Value {
        self.current_deg
    }

    pub fn target_deg(&self) -> Value {
        self.target_deg
    }

    pub fn time_to_suspend(&self) -> u32 {
        self.state.time_to_suspend(self.config.suspend_delay_ticks)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn config(&self) -> &ServoSwitchConfig {
        &self.config
    }
}

impl<P: PwmOutput> Drop for ServoSwitch<P> {
    fn drop(&mut self) {
        self.suspend();
    }
}
