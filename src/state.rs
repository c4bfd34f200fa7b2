// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Plain data shared between the telemetry input, the governor and the display.
//!
//! All types are `Copy`; only the latest value of each is ever kept.

use crate::time::Millis;

/// Latest anemometer reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindSample {
    /// Wind speed in m/s.
    pub value: f32,
    pub received_at: Millis,
}

/// Governor operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Motors commanded to zero.
    Stopped,
    /// Feed-forward from the calibration table while the flow settles.
    OpenLoop,
    /// Feed-forward plus PID correction against the measured wind speed.
    PidEngaged,
    /// Fixed command from the debug console. Never left until reboot.
    Manual,
}

/// Values the touchscreen reads for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Display {
    pub setpoint: f32,
    pub pending_setpoint: f32,
    /// Last accepted wind speed, 0 before the first sample.
    pub wind_speed: f32,
    pub running: bool,
    pub link_lost: bool,
    pub mode: Mode,
}

impl Display {
    /// The pending setpoint has been edited but not committed yet (shown highlighted).
    #[inline]
    pub fn setpoint_uncommitted(&self) -> bool {
        self.pending_setpoint != self.setpoint
    }

    /// Whether the setpoint area needs a redraw compared to `prev`.
    pub fn setpoint_changed(&self, prev: &Display) -> bool {
        self.setpoint != prev.setpoint || self.pending_setpoint != prev.pending_setpoint
    }

    /// Whether the wind-speed area needs a redraw compared to `prev`.
    pub fn wind_changed(&self, prev: &Display) -> bool {
        self.wind_speed != prev.wind_speed || self.link_lost != prev.link_lost
    }
}
