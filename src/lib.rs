// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Fan-Speed Governor Firmware
//!
//! This crate holds the firmware for the wind tunnel fan-speed governor, written in Rust,
//! targeting an STM32F777 MCU. The governor holds the tunnel's wind speed at an operator setpoint
//! by commanding the fan inverters over a Modbus RTU fieldbus, using an anemometer as feedback.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`config`] | Build-time constants and the validated [`config::GovernorConfig`] |
//! | [`control`] | Setpoint mapper, PID, telemetry watchdog and the governor state machine |
//! | [`drivers`] | Fieldbus abstraction and the Modbus RTU master |
//! | [`motors`] | The fan bank: command encoding and batch dispatch |
//! | [`protocol`] | Line framing for the anemometer and debug console |
//! | [`runtime`] | The superloop body tying everything together |
//! | [`state`] | Plain data shared with the display |
//! | `hw` | MCU-level wrappers around USART, SysTick and pins (device target only) |
//!
//! Everything except `hw` is hardware independent and is tested on the host with `cargo test`.
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Run the tunnel simulation on the host:
//!
//! ```bash
//! RUST_LOG=debug cargo run
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod motors;
pub mod protocol;
pub mod runtime;
pub mod state;
pub mod time;

#[cfg(target_os = "none")]
pub mod hw;

pub use config::GovernorConfig;
pub use runtime::ControlLoop;
