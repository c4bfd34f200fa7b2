// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Build-time configuration of the governor.
//!
//! Commands are expressed in drive counts: the fan inverters take a speed register of
//! 0..=10000, i.e. percent of full speed with two implied decimals.

use heapless::Vec;

use crate::control::mapper::{self, CalibrationPoint, CalibrationTable};
use crate::control::watchdog;

/// Maximum number of motors on the fieldbus.
pub const MAX_MOTORS: usize = 8;

/// Inverter holding register for the speed command.
pub const REG_SPEED: u16 = 102;

/// Fan inverter addresses on the RS-485 bus.
pub const MOTOR_IDS: [u8; 3] = [2, 3, 4];

/// Full-scale motor command (100.00 %).
pub const COMMAND_MAX: f32 = 10_000.0;

/// Tunnel calibration: 0..30 m/s maps linearly onto 0..100 % in 3 m/s steps.
pub const TUNNEL_TABLE: [CalibrationPoint; 11] = [
    CalibrationPoint::new(0.0, 0.0),
    CalibrationPoint::new(3.0, 1_000.0),
    CalibrationPoint::new(6.0, 2_000.0),
    CalibrationPoint::new(9.0, 3_000.0),
    CalibrationPoint::new(12.0, 4_000.0),
    CalibrationPoint::new(15.0, 5_000.0),
    CalibrationPoint::new(18.0, 6_000.0),
    CalibrationPoint::new(21.0, 7_000.0),
    CalibrationPoint::new(24.0, 8_000.0),
    CalibrationPoint::new(27.0, 9_000.0),
    CalibrationPoint::new(30.0, 10_000.0),
];

pub const OPEN_LOOP_DURATION_MS: u32 = 5_000;
pub const SEND_PERIOD_MS: u32 = 500;
pub const TICK_PERIOD_MS: u32 = 50;
pub const FIELDBUS_TIMEOUT_MS: u32 = 100;
/// RTU inter-frame silence, 3.5 characters at 9600 baud rounded up.
pub const FIELDBUS_FRAME_GAP_MS: u32 = 4;

pub const SETPOINT_MIN: f32 = 0.0;
pub const SETPOINT_MAX: f32 = 30.0;
pub const SETPOINT_STEP: f32 = 0.5;

pub const KP: f32 = 60.0;
pub const KI: f32 = 2.0;
pub const KD: f32 = 0.0;

/// Integral clamp in (m/s)·cycles.
pub const INTEGRAL_LIMIT: f32 = 200.0;

/// Error type for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    Table(mapper::Error),
    /// `setpoint_min > setpoint_max`, or a bound is not finite.
    SetpointBounds,
    /// Step must be positive and finite.
    SetpointStep,
    /// `command_max` must be positive and fit the 16-bit speed register.
    CommandMax,
    /// At least one motor id is required.
    NoMotors,
    /// More than [`MAX_MOTORS`] motor ids.
    TooManyMotors,
    /// The integral limit must be positive (infinity disables the clamp).
    IntegralLimit,
    /// `manual_max` exceeds `command_max`, so a manual override could not reach the motors.
    ManualMax,
}

impl From<mapper::Error> for Error {
    fn from(e: mapper::Error) -> Self {
        Error::Table(e)
    }
}

/// PID gains, per control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Complete governor configuration.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub table: CalibrationTable,
    pub gains: Gains,
    pub integral_limit: f32,

    pub open_loop_duration_ms: u32,
    pub watchdog_timeout_ms: u32,
    pub send_period_ms: u32,
    pub tick_period_ms: u32,
    pub fieldbus_timeout_ms: u32,
    pub fieldbus_frame_gap_ms: u32,

    /// Upper clamp of the automatic command (drive counts).
    pub command_max: f32,
    /// Upper bound accepted on the debug override channel.
    pub manual_max: f32,

    pub setpoint_min: f32,
    pub setpoint_max: f32,
    pub setpoint_step: f32,

    pub motor_ids: Vec<u8, MAX_MOTORS>,
    pub speed_register: u16,

    /// Set when [`with_motor_ids`](Self::with_motor_ids) was given more than [`MAX_MOTORS`] ids.
    motor_overflow: bool,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        let mut motor_ids = Vec::new();
        for id in MOTOR_IDS {
            let _ = motor_ids.push(id);
        }

        Self {
            table: tunnel_table(),
            gains: Gains {
                kp: KP,
                ki: KI,
                kd: KD,
            },
            integral_limit: INTEGRAL_LIMIT,

            open_loop_duration_ms: OPEN_LOOP_DURATION_MS,
            watchdog_timeout_ms: watchdog::DEFAULT_TIMEOUT_MS,
            send_period_ms: SEND_PERIOD_MS,
            tick_period_ms: TICK_PERIOD_MS,
            fieldbus_timeout_ms: FIELDBUS_TIMEOUT_MS,
            fieldbus_frame_gap_ms: FIELDBUS_FRAME_GAP_MS,

            command_max: COMMAND_MAX,
            manual_max: COMMAND_MAX,

            setpoint_min: SETPOINT_MIN,
            setpoint_max: SETPOINT_MAX,
            setpoint_step: SETPOINT_STEP,

            motor_ids,
            speed_register: REG_SPEED,
            motor_overflow: false,
        }
    }
}

fn tunnel_table() -> CalibrationTable {
    match CalibrationTable::new(&TUNNEL_TABLE) {
        Ok(table) => table,
        // TUNNEL_TABLE is a constant and validated by the tests below.
        Err(_) => unreachable!("built-in calibration table is invalid"),
    }
}

impl GovernorConfig {
    pub fn with_table(mut self, table: CalibrationTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.gains = Gains { kp, ki, kd };
        self
    }

    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    pub fn with_open_loop_duration_ms(mut self, ms: u32) -> Self {
        self.open_loop_duration_ms = ms;
        self
    }

    pub fn with_watchdog_timeout_ms(mut self, ms: u32) -> Self {
        self.watchdog_timeout_ms = ms;
        self
    }

    pub fn with_send_period_ms(mut self, ms: u32) -> Self {
        self.send_period_ms = ms;
        self
    }

    pub fn with_command_max(mut self, max: f32) -> Self {
        self.command_max = max;
        self
    }

    pub fn with_manual_max(mut self, max: f32) -> Self {
        self.manual_max = max;
        self
    }

    pub fn with_setpoint_bounds(mut self, min: f32, max: f32) -> Self {
        self.setpoint_min = min;
        self.setpoint_max = max;
        self
    }

    /// Replace the motor id list. Ids past [`MAX_MOTORS`] are reported by [`validate`](Self::validate).
    pub fn with_motor_ids(mut self, ids: &[u8]) -> Self {
        self.motor_ids.clear();
        self.motor_overflow = false;
        for &id in ids {
            if self.motor_ids.push(id).is_err() {
                self.motor_overflow = true;
                break;
            }
        }
        self
    }

    /// Check cross-field invariants. The calibration table validates itself on construction.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.setpoint_min.is_finite()
            && self.setpoint_max.is_finite()
            && self.setpoint_min <= self.setpoint_max)
        {
            return Err(Error::SetpointBounds);
        }
        if !(self.setpoint_step.is_finite() && self.setpoint_step > 0.0) {
            return Err(Error::SetpointStep);
        }
        let register_max = u16::MAX as f32;
        if !(self.command_max > 0.0 && self.command_max <= register_max)
            || !(self.manual_max > 0.0 && self.manual_max <= register_max)
        {
            return Err(Error::CommandMax);
        }
        if self.manual_max > self.command_max {
            return Err(Error::ManualMax);
        }
        if !(self.integral_limit > 0.0) {
            return Err(Error::IntegralLimit);
        }
        if self.motor_overflow {
            return Err(Error::TooManyMotors);
        }
        if self.motor_ids.is_empty() {
            return Err(Error::NoMotors);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GovernorConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.motor_ids.as_slice(), &[2, 3, 4]);
        assert_eq!(cfg.speed_register, 102);
        assert_eq!(cfg.table.map(15.0), 5_000.0);
        assert_eq!(cfg.table.map(30.0), 10_000.0);
    }

    #[test]
    fn rejects_inverted_setpoint_bounds() {
        let cfg = GovernorConfig::default().with_setpoint_bounds(10.0, 5.0);
        assert_eq!(cfg.validate(), Err(Error::SetpointBounds));
    }

    #[test]
    fn rejects_motor_lists() {
        let cfg = GovernorConfig::default().with_motor_ids(&[]);
        assert_eq!(cfg.validate(), Err(Error::NoMotors));
        let cfg = GovernorConfig::default().with_motor_ids(&[1; MAX_MOTORS + 1]);
        assert_eq!(cfg.validate(), Err(Error::TooManyMotors));
    }

    #[test]
    fn manual_max_must_fit_command_max() {
        let cfg = GovernorConfig::default().with_command_max(5_000.0);
        assert_eq!(cfg.validate(), Err(Error::ManualMax));

        let cfg = GovernorConfig::default()
            .with_command_max(5_000.0)
            .with_manual_max(5_000.0);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_oversized_command() {
        let cfg = GovernorConfig::default().with_command_max(70_000.0);
        assert_eq!(cfg.validate(), Err(Error::CommandMax));
    }
}
