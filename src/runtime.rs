// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The governor's superloop body.
//!
//! [`ControlLoop`] owns every piece of mutable state: the governor, the watchdog, the latest wind
//! sample, the line parsers and the fieldbus. The caller polls its inputs and calls
//! [`ControlLoop::cycle`] once per iteration:
//!
//! ```ignore
//! loop {
//!     let now = clock.now_ms();
//!     while let Ok(b) = anemometer.read() { control.push_telemetry_byte(b, now); }
//!     while let Ok(b) = console.read() { control.push_console_byte(b, now); }
//!     control.cycle(now);
//!     delay.delay_ms(config.tick_period_ms);
//! }
//! ```
//!
//! Nothing here is shared with an interrupt handler, so no locking is needed.

use crate::config::{self, GovernorConfig};
use crate::control::{Governor, Watchdog};
use crate::drivers::Fieldbus;
use crate::motors::{BatchReport, FanBank};
use crate::protocol::{parse_debug_line, parse_wind_speed, Command, DebugLine, LineParser};
use crate::state::{Display, Mode, WindSample};
use crate::time::{elapsed_ms, Millis};

/// Longest anemometer line accepted.
pub const TELEMETRY_LINE_LEN: usize = 32;

/// Longest debug-console line accepted.
pub const CONSOLE_LINE_LEN: usize = 32;

/// What one cycle decided and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub target: f32,
    pub mode: Mode,
    /// Batch pushed to the fans this cycle, if any.
    pub sent: Option<BatchReport>,
}

pub struct ControlLoop<B: Fieldbus> {
    governor: Governor,
    watchdog: Watchdog,
    fans: FanBank,
    bus: B,

    wind: Option<WindSample>,
    telemetry: LineParser<TELEMETRY_LINE_LEN>,
    console: LineParser<CONSOLE_LINE_LEN>,

    manual_max: f32,
    send_period_ms: u32,
    last_send: Option<Millis>,
    /// A zero command is owed to the fans (stop or fail-safe) and has not gone out yet.
    halt_owed: bool,
}

impl<B: Fieldbus> ControlLoop<B> {
    /// Validate `config` and build a stopped control loop. The watchdog starts counting at `now`.
    pub fn new(config: &GovernorConfig, bus: B, now: Millis) -> Result<Self, config::Error> {
        let governor = Governor::new(config)?;

        Ok(Self {
            governor,
            watchdog: Watchdog::new(config.watchdog_timeout_ms, now),
            fans: FanBank::from_config(config),
            bus,

            wind: None,
            telemetry: LineParser::new(),
            console: LineParser::new(),

            manual_max: config.manual_max,
            send_period_ms: config.send_period_ms,
            last_send: None,
            halt_owed: false,
        })
    }

    #[inline]
    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    #[inline]
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    #[inline]
    pub fn fans(&self) -> &FanBank {
        &self.fans
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    pub fn wind(&self) -> Option<WindSample> {
        self.wind
    }

    /// Apply an operator intent.
    ///
    /// START is refused while the anemometer link is lost; the operator has to wait for telemetry
    /// to come back. A START that raises the run flag sends the new target on the next cycle,
    /// regardless of when the last batch went out.
    pub fn command(&mut self, cmd: Command, now: Millis) {
        match cmd {
            Command::AdjustDown => self.governor.adjust_down(),
            Command::AdjustUp => self.governor.adjust_up(),
            Command::Commit => self.governor.commit_setpoint(now),
            Command::Start => {
                if self.watchdog.is_lost(now) {
                    log::warn!("governor: start refused, no telemetry");
                } else {
                    let was_running = self.governor.is_running();
                    self.governor.start(now);
                    if !was_running && self.governor.is_running() {
                        self.last_send = None;
                    }
                }
            }
            Command::Stop => self.governor.stop(),
        }
    }

    /// Feed one byte from the anemometer UART.
    pub fn push_telemetry_byte(&mut self, byte: u8, now: Millis) {
        if let Some(line) = self.telemetry.push(byte) {
            self.on_telemetry_line(&line, now);
        }
    }

    /// Handle one complete anemometer line. Returns whether it produced a sample.
    pub fn on_telemetry_line(&mut self, line: &[u8], now: Millis) -> bool {
        match parse_wind_speed(line) {
            Some(value) => {
                log::debug!("telemetry: wind {} m/s", value);
                self.wind = Some(WindSample {
                    value,
                    received_at: now,
                });
                self.watchdog.on_sample_received(now);
                true
            }
            None => false,
        }
    }

    /// Feed one byte from the debug console UART.
    pub fn push_console_byte(&mut self, byte: u8, now: Millis) {
        if let Some(line) = self.console.push(byte) {
            self.on_console_line(&line, now);
        }
    }

    /// Handle one complete debug-console line.
    pub fn on_console_line(&mut self, line: &[u8], now: Millis) {
        match parse_debug_line(line, self.manual_max) {
            Some(DebugLine::Operator(cmd)) => self.command(cmd, now),
            Some(DebugLine::ManualCommand(value)) => {
                if let Err(e) = self.governor.enter_manual(value) {
                    log::debug!("debug console: {:?}", e);
                }
            }
            None => {}
        }
    }

    fn send_due(&self, now: Millis) -> bool {
        match self.last_send {
            Some(at) => elapsed_ms(now, at) >= self.send_period_ms,
            None => true,
        }
    }

    fn dispatch(&mut self, command: f32, now: Millis) -> BatchReport {
        self.last_send = Some(now);
        self.fans.send_command(&mut self.bus, command)
    }

    /// Run one control cycle: watchdog check, governor tick, and fan dispatch when due.
    ///
    /// A zero command goes out as soon as the governor stops, regardless of the send cadence.
    /// While running, the target is re-sent every `send_period_ms`. Nothing is sent while the bus
    /// reports a transaction in flight.
    pub fn cycle(&mut self, now: Millis) -> CycleReport {
        let lost = self.watchdog.is_lost(now);
        let out = self.governor.tick(now, self.wind, lost);
        self.halt_owed |= out.halt;

        let sent = if self.bus.is_busy() {
            None
        } else if self.halt_owed {
            self.halt_owed = false;
            Some(self.dispatch(0.0, now))
        } else if self.governor.is_running() && self.send_due(now) {
            Some(self.dispatch(out.target, now))
        } else {
            None
        };

        CycleReport {
            target: out.target,
            mode: self.governor.mode(),
            sent,
        }
    }

    /// Values for the touchscreen.
    pub fn display(&self) -> Display {
        let state = self.governor.state();
        Display {
            setpoint: state.setpoint,
            pending_setpoint: state.pending_setpoint,
            wind_speed: self.wind.map(|w| w.value).unwrap_or(0.0),
            running: state.run_requested,
            link_lost: self.watchdog.status().lost,
            mode: state.mode,
        }
    }
}
