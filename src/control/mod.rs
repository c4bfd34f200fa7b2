// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! Hardware-independent building blocks of the fan-speed governor.
//!
//! ## Modules
//!
//! - [`mapper`] - Calibration table and setpoint to command interpolation.
//! - [`watchdog`] - Anemometer link supervision.
//! - [`pid`] - Per-cycle PID corrector.
//! - [`governor`] - Run/stop, open-loop/closed-loop and manual-override state machine.

pub mod governor;
pub mod mapper;
pub mod pid;
pub mod watchdog;

pub use governor::{ControlState, Governor, TickOutput};
pub use mapper::{CalibrationPoint, CalibrationTable};
pub use pid::Pid;
pub use watchdog::{LinkState, Watchdog, WatchdogStatus};
