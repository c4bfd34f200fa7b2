// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board bring-up and the governor superloop.

use cortex_m_rt::{entry, exception};
use log::LevelFilter;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use fan_governor::{
    drivers::ModbusRtu,
    hw::{clock, usart, BoardPins, Led, SysTickClock, Usart},
    state::Mode,
    time::{elapsed_ms, Clock},
    ControlLoop, GovernorConfig,
};

/// Bytes taken from one UART per loop pass.
const RX_BURST: usize = 16;

#[entry]
fn main() -> ! {
    // Peripherals
    let (Some(dp), Some(cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take()) else {
        panic!("peripherals already taken");
    };

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let clock = SysTickClock::start(cp.SYST, &clocks);

    // GPIO
    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);

    // LED
    let mut led_red = Led::active_low(pins.leds.red);
    let mut led_yellow = Led::active_low(pins.leds.yellow);
    let mut led_green = Led::active_low(pins.leds.green);

    // USART1 (DBG)
    let serial = Serial::new(
        dp.USART1,
        (pins.debug.tx, pins.debug.rx),
        &clocks,
        Config {
            baud_rate: 115_200.bps(),
            ..Default::default()
        },
    );
    let (dbg_tx, mut dbg_rx) = serial.split();
    usart::init_logger(Usart::new(dbg_tx), LevelFilter::Info);

    let config = GovernorConfig::default();

    // USART2 (RS-485 fieldbus)
    let serial = Serial::new(
        dp.USART2,
        (pins.rs485.tx, pins.rs485.rx),
        &clocks,
        Config {
            baud_rate: 9_600.bps(),
            ..Default::default()
        },
    );
    let (bus_tx, bus_rx) = serial.split();
    let bus = ModbusRtu::new(
        bus_tx,
        bus_rx,
        pins.rs485.de,
        clock,
        config.fieldbus_timeout_ms,
    )
    .with_frame_gap_ms(config.fieldbus_frame_gap_ms);

    // USART3 (anemometer)
    let serial = Serial::new(
        dp.USART3,
        (pins.anemometer.tx, pins.anemometer.rx),
        &clocks,
        Config {
            baud_rate: 9_600.bps(),
            ..Default::default()
        },
    );
    let (_, mut wind_rx) = serial.split();

    let mut control = match ControlLoop::new(&config, bus, clock.now_ms()) {
        Ok(control) => control,
        Err(e) => {
            log::error!("config: {:?}", e);
            led_red.set(true);
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    log::info!("fan governor ready, motors {:?}", control.fans().motor_ids());

    let mut last_tick = clock.now_ms();
    loop {
        let now = clock.now_ms();
        usart::poll_bytes(&mut wind_rx, RX_BURST, |b| control.push_telemetry_byte(b, now));
        usart::poll_bytes(&mut dbg_rx, RX_BURST, |b| control.push_console_byte(b, now));

        if elapsed_ms(now, last_tick) < config.tick_period_ms {
            continue;
        }
        last_tick = now;

        control.cycle(now);

        let display = control.display();
        led_red.set(display.link_lost);
        led_yellow.set(display.mode == Mode::PidEngaged);
        led_green.set(display.running);
    }
}

#[exception]
fn SysTick() {
    clock::on_systick();
}
