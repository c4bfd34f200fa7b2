// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! End-to-end governor behaviour driven through the public API.

use fan_governor::{
    config::GovernorConfig,
    control::CalibrationTable,
    drivers::Fieldbus,
    protocol::Command,
    state::Mode,
    time::Millis,
    ControlLoop,
};

/// Acknowledges every write and keeps them in order.
#[derive(Default)]
struct RecordingBus {
    writes: Vec<(u8, u16, u16)>,
}

impl RecordingBus {
    fn last_batch(&self) -> &[(u8, u16, u16)] {
        &self.writes[self.writes.len().saturating_sub(3)..]
    }
}

impl Fieldbus for RecordingBus {
    type Error = ();

    fn write_register(&mut self, device: u8, register: u16, value: u16) -> Result<(), ()> {
        self.writes.push((device, register, value));
        Ok(())
    }
}

fn config() -> GovernorConfig {
    GovernorConfig::default()
        .with_table(
            CalibrationTable::from_pairs(&[(0.0, 0.0), (10.0, 4_000.0), (30.0, 10_000.0)])
                .unwrap(),
        )
        .with_gains(1.5, 0.0, 0.0)
}

fn control() -> ControlLoop<RecordingBus> {
    ControlLoop::new(&config(), RecordingBus::default(), 0).unwrap()
}

fn wind(c: &mut ControlLoop<RecordingBus>, value: f32, now: Millis) {
    for b in format!("{:.2}\r\n", value).bytes() {
        c.push_telemetry_byte(b, now);
    }
}

fn console(c: &mut ControlLoop<RecordingBus>, line: &str, now: Millis) {
    for b in line.bytes().chain(*b"\r\n") {
        c.push_console_byte(b, now);
    }
}

fn commit_setpoint(c: &mut ControlLoop<RecordingBus>, setpoint: f32, now: Millis) {
    for _ in 0..(setpoint / 0.5) as usize {
        c.command(Command::AdjustUp, now);
    }
    c.command(Command::Commit, now);
}

#[test]
fn table_interpolates_between_points() {
    let table = CalibrationTable::from_pairs(&[(0.0, 0.0), (3.0, 10.0), (6.0, 20.0)]).unwrap();
    assert_eq!(table.map(4.5), 15.0);
}

#[test]
fn open_loop_hands_over_to_pid_at_duration() {
    let mut c = control();
    commit_setpoint(&mut c, 10.0, 0);
    wind(&mut c, 0.0, 0);
    c.command(Command::Start, 0);

    let mut t = 0;
    while t < 5_000 {
        if t % 500 == 0 {
            wind(&mut c, 8.0, t);
        }
        assert_eq!(c.cycle(t).mode, Mode::OpenLoop);
        t += 50;
    }

    c.cycle(4_999);
    assert_eq!(c.governor().mode(), Mode::OpenLoop);
    c.cycle(5_000);
    assert_eq!(c.governor().mode(), Mode::PidEngaged);
}

#[test]
fn pid_correction_adds_to_feed_forward() {
    let mut c = control();
    commit_setpoint(&mut c, 10.0, 0);
    wind(&mut c, 8.0, 0);
    c.command(Command::Start, 0);
    c.cycle(0);

    wind(&mut c, 8.0, 2_000);
    wind(&mut c, 8.0, 4_000);
    c.cycle(5_000);
    assert!(c.governor().pid_active());

    let report = c.cycle(5_050);
    assert_eq!(report.target, 4_000.0 + 3.0);
    assert_eq!(c.governor().pid_last_error(), 2.0);
}

#[test]
fn silent_anemometer_stops_fans() {
    let mut c = control();
    commit_setpoint(&mut c, 10.0, 0);
    wind(&mut c, 9.0, 0);
    c.command(Command::Start, 0);

    let mut t = 0;
    while t < 2_500 {
        let report = c.cycle(t);
        assert!(c.governor().is_running());
        assert_ne!(report.target, 0.0);
        t += 50;
    }

    let report = c.cycle(2_500);
    assert_eq!(report.mode, Mode::Stopped);
    assert_eq!(report.target, 0.0);
    assert_eq!(report.sent.map(|r| r.value), Some(0));
    assert_eq!(
        c.bus().last_batch(),
        &[(2, 102, 0), (3, 102, 0), (4, 102, 0)]
    );
    assert!(c.display().link_lost);

    // Telemetry returns, but the fans stay off until the operator restarts.
    wind(&mut c, 0.0, 3_000);
    let report = c.cycle(3_000);
    assert_eq!(report.mode, Mode::Stopped);
    assert_eq!(report.sent, None);
    c.command(Command::Start, 3_050);
    assert_eq!(c.cycle(3_050).mode, Mode::OpenLoop);
}

#[test]
fn manual_override_waits_for_start() {
    let mut c = control();
    wind(&mut c, 3.0, 0);
    console(&mut c, "4200", 0);
    assert_eq!(c.governor().mode(), Mode::Manual);

    for t in (0..1_000).step_by(50) {
        let report = c.cycle(t);
        assert_eq!(report.target, 0.0);
        assert_eq!(report.sent, None);
    }

    console(&mut c, "start", 1_000);
    let report = c.cycle(1_000);
    assert_eq!(report.target, 4_200.0);
    assert_eq!(report.sent.map(|r| r.value), Some(4_200));

    // Setpoint edits and telemetry have no effect on the manual command.
    commit_setpoint(&mut c, 20.0, 1_100);
    wind(&mut c, 25.0, 1_100);
    assert_eq!(c.cycle(1_100).target, 4_200.0);
    assert_eq!(c.governor().mode(), Mode::Manual);
}

#[test]
fn manual_output_drops_to_zero_on_link_loss() {
    let mut c = control();
    wind(&mut c, 3.0, 0);
    console(&mut c, "4200", 0);
    console(&mut c, "start", 0);
    assert_eq!(c.cycle(0).target, 4_200.0);

    let report = c.cycle(2_500);
    assert_eq!(report.target, 0.0);
    assert_eq!(report.sent.map(|r| r.value), Some(0));
    assert_eq!(report.mode, Mode::Manual);
    assert!(!c.display().running);
}

#[test]
fn manual_ceiling_cannot_exceed_motor_ceiling() {
    let cfg = config().with_command_max(5_000.0);
    assert!(ControlLoop::new(&cfg, RecordingBus::default(), 0).is_err());

    let cfg = cfg.with_manual_max(5_000.0);
    let mut c = ControlLoop::new(&cfg, RecordingBus::default(), 0).unwrap();
    wind(&mut c, 3.0, 0);
    console(&mut c, "8000", 0);
    assert_eq!(c.governor().mode(), Mode::Stopped);

    console(&mut c, "5000", 0);
    console(&mut c, "start", 0);
    let report = c.cycle(0);
    assert_eq!(report.target, 5_000.0);
    assert_eq!(report.sent.map(|r| r.value), Some(5_000));
}
