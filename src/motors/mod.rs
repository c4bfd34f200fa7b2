// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! This module contains motor-level wrappers that sit above device-level drivers in `drivers`.
//!
//! ## Modules
//!
//! - [`fan_bank`] - The tunnel fans, commanded together over the Modbus fieldbus.

pub mod fan_bank;

pub use fan_bank::{BatchReport, FanBank, MotorCommandBatch, MotorWrite};
