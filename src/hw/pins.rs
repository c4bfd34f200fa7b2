// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 governor board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpiod, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub debug: Usart1Pins,
    pub rs485: Usart2Pins,
    pub anemometer: Usart3Pins,
}

pub struct LedPins {
    /// Anemometer link lost.
    pub red: gpiod::PD8<Output<PushPull>>,
    pub yellow: gpiod::PD9<Output<PushPull>>,
    /// Fans running.
    pub green: gpiod::PD10<Output<PushPull>>,
}

/// Debug console (USB virtual COM)
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// RS-485 transceiver for the fan inverters
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
    /// Driver enable, high while transmitting.
    pub de: gpiod::PD4<Output<PushPull>>,
}

/// Anemometer serial output
pub struct Usart3Pins {
    pub tx: gpiob::PB10<Alternate<7>>,
    pub rx: gpiob::PB11<Alternate<7>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpiod = gpiod.split();

        Self {
            leds: LedPins {
                red: gpiod.pd8.into_push_pull_output(),
                yellow: gpiod.pd9.into_push_pull_output(),
                green: gpiod.pd10.into_push_pull_output(),
            },

            debug: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            rs485: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
                de: gpiod.pd4.into_push_pull_output(),
            },

            anemometer: Usart3Pins {
                tx: gpiob.pb10.into_alternate::<7>(),
                rx: gpiob.pb11.into_alternate::<7>(),
            },
        }
    }
}
