// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond time base from the Cortex-M SysTick timer.
//!
//! The firmware binary must forward the `SysTick` exception to [`on_systick`].

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use stm32f7xx_hal::rcc::Clocks;

use crate::time::{Clock, Millis};

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Advance the millisecond counter. Call from the `SysTick` exception handler only.
#[inline]
pub fn on_systick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Handle to the SysTick millisecond counter.
#[derive(Clone, Copy)]
pub struct SysTickClock {
    _private: (),
}

impl SysTickClock {
    /// Start SysTick at 1 kHz from the core clock.
    pub fn start(mut syst: SYST, clocks: &Clocks) -> Self {
        let reload = clocks.sysclk().raw() / 1_000 - 1;
        syst.set_clock_source(SystClkSource::Core);
        syst.set_reload(reload);
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();
        Self { _private: () }
    }
}

impl Clock for SysTickClock {
    #[inline]
    fn now_ms(&self) -> Millis {
        MILLIS.load(Ordering::Relaxed)
    }
}
