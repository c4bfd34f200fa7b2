// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Text protocols spoken on the anemometer and debug serial ports.

pub mod messages;
pub mod parser;

pub use messages::{Command, DebugLine};
pub use parser::{parse_debug_line, parse_wind_speed, LineParser};
