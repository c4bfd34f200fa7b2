// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! application logic.
//!
//! ## Existing drivers
//!
//! - [`modbus`] – Modbus RTU master over RS-485, used for the fan inverters

pub mod modbus;

pub use modbus::ModbusRtu;

/// Register-write access to the devices on a shared fieldbus.
pub trait Fieldbus {
    type Error: core::fmt::Debug;

    /// Write `value` to `register` on `device`, blocking until that transaction completes.
    fn write_register(&mut self, device: u8, register: u16, value: u16) -> Result<(), Self::Error>;

    /// A transaction is still in flight. Blocking implementations are never busy between calls.
    fn is_busy(&self) -> bool {
        false
    }
}

impl<F: Fieldbus + ?Sized> Fieldbus for &mut F {
    type Error = F::Error;

    fn write_register(&mut self, device: u8, register: u16, value: u16) -> Result<(), Self::Error> {
        (**self).write_register(device, register, value)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }
}
