use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::raw::NoopRawMutex,
    channel::{self, Channel},
};
use embassy_time::{Duration, Ticker};

use crate::{Error, PwmOutput, Result, ServoSwitch, SwitchState};

enum SwitchCommand {
    On,
    Off,
    Toggle,
    Suspend,
    Resume,
    Status,
    #[cfg(test)]
    Shutdown,
}

/// Snapshot of a running switch, returned by [`ServoSwitchClient::status`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchStatus {
    pub state_on: bool,
    pub state_off: bool,
    pub suspended: bool,
    pub state: SwitchState,
}

pub struct ServoSwitchChannel {
    command_channel: channel::Channel<NoopRawMutex, SwitchCommand, 2>,
    response_channel: channel::Channel<NoopRawMutex, Option<SwitchStatus>, 2>,
}

impl ServoSwitchChannel {
    pub fn new() -> Self {
        Self {
            command_channel: Channel::new(),
            response_channel: Channel::new(),
        }
    }
}

impl Default for ServoSwitchChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ServoSwitchClient<'a> {
    channel: &'a ServoSwitchChannel,
}

impl<'a> ServoSwitchClient<'a> {
    pub fn new(channel: &'a ServoSwitchChannel) -> Self {
        Self { channel }
    }

    async fn send(&mut self, command: SwitchCommand) -> Option<SwitchStatus> {
        self.channel.command_channel.send(command).await;
        self.channel.response_channel.receive().await
    }

    async fn send_no_response(&mut self, command: SwitchCommand) -> Result<()> {
        match self.send(command).await {
            Some(_) => Err(Error::InvalidCommandResponse),
            None => Ok(()),
        }
    }

    pub async fn on(&mut self) -> Result<()> {
        self.send_no_response(SwitchCommand::On).await
    }

    pub async fn off(&mut self) -> Result<()> {
        self.send_no_response(SwitchCommand::Off).await
    }

    pub async fn toggle(&mut self) -> Result<()> {
        self.send_no_response(SwitchCommand::Toggle).await
    }

    pub async fn suspend(&mut self) -> Result<()> {
        self.send_no_response(SwitchCommand::Suspend).await
    }

    pub async fn resume(&mut self) -> Result<()> {
        self.send_no_response(SwitchCommand::Resume).await
    }

    pub async fn status(&mut self) -> Result<SwitchStatus> {
        self.send(SwitchCommand::Status)
            .await
            .ok_or(Error::InvalidCommandResponse)
    }

    #[cfg(test)]
    pub async fn shutdown(&mut self) {
        self.channel
            .command_channel
            .send(SwitchCommand::Shutdown)
            .await;
    }
}

impl<P: PwmOutput> ServoSwitch<P> {
    /// Drives the switch from an embassy ticker, calling
    /// [`ServoSwitch::update`] every `tick` and serving commands from
    /// `channel` in between.
    pub async fn run(&mut self, channel: &ServoSwitchChannel, tick: Duration) {
        let mut ticker = Ticker::every(tick);
        loop {
            match select(ticker.next(), channel.command_channel.receive()).await {
                Either::First(()) => self.update(),
                Either::Second(command) => {
                    if self.handle_command(channel, command).await {
                        return;
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, channel: &ServoSwitchChannel, command: SwitchCommand) -> bool {
        let response = match command {
            SwitchCommand::On => {
                self.on();
                None
            }
            SwitchCommand::Off => {
                self.off();
                None
            }
            SwitchCommand::Toggle => {
                self.toggle();
                None
            }
            SwitchCommand::Suspend => {
                self.suspend();
                None
            }
            SwitchCommand::Resume => {
                self.resume();
                None
            }
            SwitchCommand::Status => Some(self.status()),
            #[cfg(test)]
            SwitchCommand::Shutdown => return true,
        };
        channel.response_channel.send(response).await;

        false
    }

    pub fn status(&self) -> SwitchStatus {
        SwitchStatus {
            state_on: self.is_state_on(),
            state_off: self.is_state_off(),
            suspended: self.is_suspended(),
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::join::join;
    use embassy_time::Timer;

    use super::*;
    use crate::testing::{FakePwm, PwmEvent};
    use crate::{ServoSwitchConfig, Value};

    const TICK: Duration = Duration::from_millis(1);

    fn one_step_config() -> ServoSwitchConfig {
        ServoSwitchConfig {
            step_deg: Value::from_num(180),
            suspend_delay_ticks: 10_000,
            ..Default::default()
        }
    }

    #[futures_test::test]
    async fn shutdown_stops_runner() {
        let mut pwm = FakePwm::new();
        let mut switch = ServoSwitch::new(
            &mut pwm,
            2,
            0,
            Value::from_num(0),
            Value::from_num(180),
            true,
        );
        let channel = ServoSwitchChannel::new();
        let run_future = switch.run(&channel, TICK);
        let test_future = async {
            ServoSwitchClient::new(&channel).shutdown().await;
        };
        join(run_future, test_future).await;
        assert!(switch.is_state_off());
    }

    #[futures_test::test]
    async fn on_command_moves_switch() {
        let mut pwm = FakePwm::new();
        let mut switch = ServoSwitch::with_config(
            &mut pwm,
            2,
            0,
            Value::from_num(0),
            Value::from_num(180),
            true,
            one_step_config(),
        )
        .unwrap();
        let channel = ServoSwitchChannel::new();
        let run_future = switch.run(&channel, TICK);
        let test_future = async {
            let mut client = ServoSwitchClient::new(&channel);
            let before = client.status().await.unwrap();
            client.on().await.unwrap();
            Timer::after(Duration::from_millis(20)).await;
            let after = client.status().await.unwrap();
            client.shutdown().await;
            (before, after)
        };
        let (_, (before, after)) = join(run_future, test_future).await;

        assert!(before.state_off);
        assert!(!before.suspended);
        assert!(after.state_on);
        assert!(!after.state_off);
        assert!(matches!(after.state, SwitchState::Settling { .. }));
        drop(switch);

        assert!(!pwm.writes().is_empty());
    }

    #[futures_test::test]
    async fn toggle_command_flips_target() {
        let mut pwm = FakePwm::new();
        let mut switch = ServoSwitch::with_config(
            &mut pwm,
            2,
            0,
            Value::from_num(0),
            Value::from_num(180),
            false,
            one_step_config(),
        )
        .unwrap();
        let channel = ServoSwitchChannel::new();
        let run_future = switch.run(&channel, TICK);
        let test_future = async {
            let mut client = ServoSwitchClient::new(&channel);
            client.toggle().await.unwrap();
            Timer::after(Duration::from_millis(20)).await;
            let status = client.status().await.unwrap();
            client.shutdown().await;
            status
        };
        let (_, status) = join(run_future, test_future).await;
        assert!(status.state_on);
        assert!(!status.suspended);
        assert_eq!(switch.target_deg(), Value::from_num(180));
    }

    #[futures_test::test]
    async fn suspend_and_resume_commands() {
        let mut pwm = FakePwm::new();
        let mut switch = ServoSwitch::with_config(
            &mut pwm,
            2,
            0,
            Value::from_num(0),
            Value::from_num(180),
            true,
            one_step_config(),
        )
        .unwrap();
        let channel = ServoSwitchChannel::new();
        let run_future = switch.run(&channel, TICK);
        let test_future = async {
            let mut client = ServoSwitchClient::new(&channel);
            client.suspend().await.unwrap();
            let suspended = client.status().await.unwrap();
            client.resume().await.unwrap();
            let resumed = client.status().await.unwrap();
            client.shutdown().await;
            (suspended, resumed)
        };
        let (_, (suspended, resumed)) = join(run_future, test_future).await;
        assert!(suspended.suspended);
        assert_eq!(suspended.state, SwitchState::Suspended);
        assert!(!resumed.suspended);
        drop(switch);

        assert!(pwm.events.contains(&PwmEvent::Detach { pin: 2 }));
    }
}
