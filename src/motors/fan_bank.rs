// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The tunnel's fan motors, driven together over the fieldbus.
//!
//! Every fan gets the same speed command. A batch is written one device at a time; a failed write
//! is logged and the remaining devices are still attempted. The next batch retries naturally.

use heapless::Vec;
use micromath::F32Ext;

use crate::config::{GovernorConfig, MAX_MOTORS};
use crate::drivers::Fieldbus;

/// One register write of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorWrite {
    pub device: u8,
    pub register: u16,
    pub value: u16,
}

/// Writes making up one dispatch, built fresh for every send.
pub type MotorCommandBatch = Vec<MotorWrite, MAX_MOTORS>;

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Register value sent to every device.
    pub value: u16,
    pub acked: usize,
    /// Devices whose write failed.
    pub failed: Vec<u8, MAX_MOTORS>,
}

impl BatchReport {
    #[inline]
    pub fn all_acked(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct FanBank {
    motor_ids: Vec<u8, MAX_MOTORS>,
    register: u16,
    command_max: f32,
}

impl FanBank {
    pub fn new(motor_ids: &[u8], register: u16, command_max: f32) -> Self {
        let mut ids = Vec::new();
        for &id in motor_ids.iter().take(MAX_MOTORS) {
            let _ = ids.push(id);
        }
        Self {
            motor_ids: ids,
            register,
            command_max,
        }
    }

    pub fn from_config(config: &GovernorConfig) -> Self {
        Self::new(&config.motor_ids, config.speed_register, config.command_max)
    }

    #[inline]
    pub fn motor_ids(&self) -> &[u8] {
        &self.motor_ids
    }

    /// Register encoding of a command: clamped to `[0, command_max]`, rounded to whole counts.
    pub fn encode(&self, command: f32) -> u16 {
        // NaN fails every comparison; treat it as a stop.
        let c = if command.is_nan() {
            0.0
        } else {
            command.clamp(0.0, self.command_max)
        };
        F32Ext::round(c) as u16
    }

    /// Build the per-device writes for `command`.
    pub fn batch(&self, command: f32) -> MotorCommandBatch {
        let value = self.encode(command);
        let mut batch = Vec::new();
        for &device in &self.motor_ids {
            let _ = batch.push(MotorWrite {
                device,
                register: self.register,
                value,
            });
        }
        batch
    }

    /// Push `command` to every fan, one synchronous transaction at a time.
    pub fn send_command<B: Fieldbus>(&self, bus: &mut B, command: f32) -> BatchReport {
        let batch = self.batch(command);
        let mut report = BatchReport {
            value: self.encode(command),
            acked: 0,
            failed: Vec::new(),
        };

        for write in &batch {
            match bus.write_register(write.device, write.register, write.value) {
                Ok(()) => report.acked += 1,
                Err(e) => {
                    log::warn!("fieldbus: write to motor {} failed: {:?}", write.device, e);
                    let _ = report.failed.push(write.device);
                }
            }
        }

        if report.all_acked() {
            log::info!("fieldbus: sent {} counts to all motors", report.value);
        } else {
            log::info!(
                "fieldbus: sent {} counts, {}/{} motors acknowledged",
                report.value,
                report.acked,
                batch.len()
            );
        }
        report
    }
}
