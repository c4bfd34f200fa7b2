// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fan-speed governor state machine.
//!
//! The governor turns the committed wind-speed setpoint into a motor command. After `start()` it
//! runs open loop from the calibration table for a fixed settling time, then adds PID correction
//! against the measured wind speed. A lost anemometer link forces a stop.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! governor.start(now);
//!
//! loop {
//!     let out = governor.tick(now, latest_sample, watchdog.is_lost(now));
//!     // push `out.target` to the motors, immediately if `out.halt` is set
//! }
//! ```

use crate::config::{self, GovernorConfig};
use crate::control::{CalibrationTable, Pid};
use crate::state::{Mode, WindSample};
use crate::time::{elapsed_ms, Millis};

/// Error type for governor operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Manual command outside `[0, manual_max]` or not a number.
    ManualOutOfRange,
}

/// Everything the governor mutates. Owned by [`Governor`], read-only from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub mode: Mode,
    /// Operator asked for the fans to run. In [`Mode::Manual`] this gates the manual command.
    pub run_requested: bool,
    pub manual_command: f32,
    /// Committed setpoint (m/s).
    pub setpoint: f32,
    /// Operator-adjusted setpoint not yet committed (m/s).
    pub pending_setpoint: f32,
    pub open_loop_started_at: Millis,
    /// Command decided by the last tick (drive counts).
    pub target_command: f32,

    /// PID correction is applied (PID_ENGAGED only).
    pub pid_active: bool,
    pub pid_integral: f32,
    pub pid_last_error: f32,
}

/// Result of one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Motor command for this cycle (drive counts).
    pub target: f32,
    /// The governor entered a stopped condition since the last tick; a zero command must go out
    /// now regardless of the send cadence.
    pub halt: bool,
}

pub struct Governor {
    table: CalibrationTable,
    pid: Pid,
    state: ControlState,
    halt_pending: bool,

    open_loop_duration_ms: u32,
    command_max: f32,
    manual_max: f32,
    setpoint_min: f32,
    setpoint_max: f32,
    setpoint_step: f32,
}

impl Governor {
    /// Validate `config` and create a stopped governor.
    pub fn new(config: &GovernorConfig) -> Result<Self, config::Error> {
        config.validate()?;

        let pid = Pid::new(config.gains.kp, config.gains.ki, config.gains.kd)
            .with_integral_limits(-config.integral_limit, config.integral_limit);

        Ok(Self {
            table: config.table.clone(),
            pid,
            state: ControlState {
                mode: Mode::Stopped,
                run_requested: false,
                manual_command: 0.0,
                setpoint: config.setpoint_min,
                pending_setpoint: config.setpoint_min,
                open_loop_started_at: 0,
                target_command: 0.0,
                pid_active: false,
                pid_integral: 0.0,
                pid_last_error: 0.0,
            },
            halt_pending: false,

            open_loop_duration_ms: config.open_loop_duration_ms,
            command_max: config.command_max,
            manual_max: config.manual_max,
            setpoint_min: config.setpoint_min,
            setpoint_max: config.setpoint_max,
            setpoint_step: config.setpoint_step,
        })
    }

    #[inline]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.run_requested
    }

    #[inline]
    pub fn pid_active(&self) -> bool {
        self.state.pid_active
    }

    #[inline]
    pub fn pid_integral(&self) -> f32 {
        self.state.pid_integral
    }

    #[inline]
    pub fn pid_last_error(&self) -> f32 {
        self.state.pid_last_error
    }

    #[inline]
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.state.mode != mode {
            log::info!("governor: {:?} -> {:?}", self.state.mode, mode);
            self.state.mode = mode;
            self.state.pid_active = mode == Mode::PidEngaged;
        }
    }

    /// Copy the PID history into the state snapshot.
    fn sync_pid(&mut self) {
        self.state.pid_integral = self.pid.integral();
        self.state.pid_last_error = self.pid.last_error();
    }

    fn reset_pid(&mut self) {
        self.pid.reset();
        self.sync_pid();
    }

    fn enter_open_loop(&mut self, now: Millis) {
        self.set_mode(Mode::OpenLoop);
        self.state.open_loop_started_at = now;
        self.reset_pid();
    }

    fn enter_stopped(&mut self) {
        self.set_mode(Mode::Stopped);
        self.state.run_requested = false;
        self.state.target_command = 0.0;
        self.reset_pid();
        self.halt_pending = true;
    }

    /// Operator START.
    ///
    /// From STOPPED this always lands in OPEN_LOOP with a fresh PID. In MANUAL it only raises the
    /// run flag. Already running: no effect.
    pub fn start(&mut self, now: Millis) {
        match self.state.mode {
            Mode::Stopped => {
                self.state.run_requested = true;
                self.enter_open_loop(now);
            }
            Mode::Manual => {
                if !self.state.run_requested {
                    log::info!("governor: manual output enabled");
                }
                self.state.run_requested = true;
            }
            Mode::OpenLoop | Mode::PidEngaged => {}
        }
    }

    /// Operator STOP. Always requests an immediate zero command.
    pub fn stop(&mut self) {
        match self.state.mode {
            Mode::Manual => {
                self.state.run_requested = false;
                self.state.target_command = 0.0;
                self.halt_pending = true;
            }
            _ => self.enter_stopped(),
        }
    }

    /// Move the pending setpoint by `delta` m/s, bounded to the configured range.
    pub fn adjust_pending(&mut self, delta: f32) {
        let next = self.state.pending_setpoint + delta;
        self.state.pending_setpoint = next.clamp(self.setpoint_min, self.setpoint_max);
    }

    #[inline]
    pub fn adjust_up(&mut self) {
        self.adjust_pending(self.setpoint_step);
    }

    #[inline]
    pub fn adjust_down(&mut self) {
        self.adjust_pending(-self.setpoint_step);
    }

    /// Commit the pending setpoint. While running automatically, the PID history no longer
    /// matches the new operating point, so the open-loop phase restarts.
    pub fn commit_setpoint(&mut self, now: Millis) {
        self.state.setpoint = self.state.pending_setpoint;
        log::info!("governor: setpoint {} m/s", self.state.setpoint);

        if matches!(self.state.mode, Mode::OpenLoop | Mode::PidEngaged) {
            self.enter_open_loop(now);
        }
    }

    /// Latch MANUAL with a fixed command. There is no way back to automatic control.
    pub fn enter_manual(&mut self, command: f32) -> Result<(), Error> {
        if !(command >= 0.0 && command <= self.manual_max) {
            return Err(Error::ManualOutOfRange);
        }

        if self.state.mode != Mode::Manual {
            log::warn!("governor: manual override latched, automatic control disabled");
        }
        self.set_mode(Mode::Manual);
        self.state.manual_command = command;
        self.reset_pid();
        Ok(())
    }

    /// Run one control cycle.
    ///
    /// `sample` is the latest wind reading, if any was ever received. `link_lost` comes from the
    /// watchdog and overrides every other branch.
    pub fn tick(&mut self, now: Millis, sample: Option<WindSample>, link_lost: bool) -> TickOutput {
        if link_lost {
            match self.state.mode {
                Mode::OpenLoop | Mode::PidEngaged => {
                    log::warn!("governor: telemetry lost, forcing stop");
                    self.enter_stopped();
                }
                Mode::Manual if self.state.run_requested => {
                    log::warn!("governor: telemetry lost, manual output disabled");
                    self.state.run_requested = false;
                    self.halt_pending = true;
                }
                _ => {}
            }
            self.state.target_command = 0.0;
            return self.output();
        }

        let target = match self.state.mode {
            Mode::Manual => {
                if self.state.run_requested {
                    self.state.manual_command
                } else {
                    0.0
                }
            }

            Mode::Stopped => 0.0,

            Mode::OpenLoop => {
                let feed_forward = self.table.map(self.state.setpoint);
                if elapsed_ms(now, self.state.open_loop_started_at) >= self.open_loop_duration_ms {
                    self.set_mode(Mode::PidEngaged);
                }
                feed_forward.clamp(0.0, self.command_max)
            }

            Mode::PidEngaged => {
                let feed_forward = self.table.map(self.state.setpoint);
                let correction = match sample {
                    Some(s) => self.pid.update(self.state.setpoint, s.value),
                    None => 0.0,
                };
                self.sync_pid();
                (feed_forward + correction).clamp(0.0, self.command_max)
            }
        };

        self.state.target_command = target;
        self.output()
    }

    fn output(&mut self) -> TickOutput {
        let halt = self.halt_pending;
        self.halt_pending = false;
        TickOutput {
            target: self.state.target_command,
            halt,
        }
    }
}
