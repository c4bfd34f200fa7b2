// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host simulation of the tunnel.
//!
//! The fans are modelled as a first-order lag from the mean inverter command to wind speed, with
//! a plant gain slightly below the calibration table so the PID has something to correct. The
//! anemometer prints a reading every 200 ms, and a scripted operator session drives the governor
//! through the debug console.

use std::collections::BTreeMap;

use fan_governor::{
    config::COMMAND_MAX,
    drivers::Fieldbus,
    time::{elapsed_ms, Millis},
    ControlLoop, GovernorConfig,
};

/// Simulation step, equal to the control tick.
const STEP_MS: Millis = 50;
const ANEMOMETER_PERIOD_MS: Millis = 200;
const REPORT_PERIOD_MS: Millis = 1_000;

/// Wind speed at full command (m/s).
const FULL_SCALE_WIND: f32 = 27.0;
/// Flow time constant (s).
const TAU_S: f32 = 2.0;

/// Fieldbus that acknowledges every write and remembers the last value per inverter.
#[derive(Default)]
struct SimBus {
    registers: BTreeMap<u8, u16>,
}

impl SimBus {
    fn mean_command(&self) -> f32 {
        if self.registers.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.registers.values().map(|&v| f32::from(v)).sum();
        sum / self.registers.len() as f32
    }
}

impl Fieldbus for SimBus {
    type Error = core::convert::Infallible;

    fn write_register(&mut self, device: u8, _register: u16, value: u16) -> Result<(), Self::Error> {
        self.registers.insert(device, value);
        Ok(())
    }
}

/// Scripted operator input on the debug console, as `(time, line)`.
fn script() -> Vec<(Millis, String)> {
    let mut lines = Vec::new();
    // Dial in 12 m/s and start.
    for _ in 0..24 {
        lines.push((1_000, "+".to_string()));
    }
    lines.push((1_000, "set".to_string()));
    lines.push((1_500, "start".to_string()));
    // Step up to 15 m/s while regulating.
    for _ in 0..6 {
        lines.push((15_000, "+".to_string()));
    }
    lines.push((15_500, "set".to_string()));
    // Restart after the anemometer dropout.
    lines.push((38_000, "start".to_string()));
    lines.push((50_000, "stop".to_string()));
    lines
}

/// The anemometer goes quiet over this window.
fn anemometer_silent(t: Millis) -> bool {
    (30_000..35_000).contains(&t)
}

pub fn run() {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let config = GovernorConfig::default();
    let mut control = match ControlLoop::new(&config, SimBus::default(), 0) {
        Ok(control) => control,
        Err(e) => {
            log::error!("invalid configuration: {:?}", e);
            return;
        }
    };

    println!("Wind Tunnel Simulation");
    println!("======================");
    println!("Time(s) | Wind(m/s) | Setpoint | Command | Mode");
    println!("--------|-----------|----------|---------|-----------");

    let script = script();
    let mut wind = 0.0_f32;
    let mut last_reading: Option<Millis> = None;

    for t in (0..=52_000).step_by(STEP_MS as usize) {
        // Plant
        let drive = control.bus().mean_command() / COMMAND_MAX;
        let steady = drive * FULL_SCALE_WIND;
        wind += (steady - wind) * (STEP_MS as f32 / 1_000.0) / TAU_S;

        // Anemometer
        let due = last_reading.map_or(true, |at| elapsed_ms(t, at) >= ANEMOMETER_PERIOD_MS);
        if due && !anemometer_silent(t) {
            last_reading = Some(t);
            for b in format!("{:.2}\r\n", wind).bytes() {
                control.push_telemetry_byte(b, t);
            }
        }

        // Operator
        for (_, line) in script.iter().filter(|(at, _)| *at == t) {
            log::info!("operator: {}", line);
            for b in line.bytes().chain(*b"\r\n") {
                control.push_console_byte(b, t);
            }
        }

        let report = control.cycle(t);

        if t % REPORT_PERIOD_MS == 0 {
            let display = control.display();
            println!(
                "{:7} | {:9.2} | {:8.1} | {:7.0} | {:?}",
                t / 1_000,
                wind,
                display.setpoint,
                report.target,
                display.mode
            );
        }
    }
}
