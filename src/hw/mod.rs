// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers for the STM32F777 governor board. Only built for the device target.

pub mod clock;
pub mod led;
pub mod pins;
pub mod usart;

pub use clock::SysTickClock;
pub use led::Led;
pub use pins::BoardPins;
pub use usart::Usart;
