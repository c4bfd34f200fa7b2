// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line framing and parsing for the serial text protocols.
//!
//! Bytes are pushed one at a time as they come off the UART. A line ends at `\n`; surrounding
//! whitespace (including the `\r` of CRLF senders) is ignored. Lines longer than the buffer are
//! dropped whole.

use heapless::Vec;

use crate::protocol::messages::*;

/// Completed line, without terminator.
pub type Line<const N: usize> = Vec<u8, N>;

pub struct LineParser<const N: usize> {
    buf: Vec<u8, N>,
    overflow: bool,
}

impl<const N: usize> LineParser<N> {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflow: false,
        }
    }

    /// Process a single incoming byte. Returns the line when `byte` terminates one.
    pub fn push(&mut self, byte: u8) -> Option<Line<N>> {
        if byte == b'\n' {
            let line = self.buf.clone();
            self.buf.clear();
            if self.overflow {
                self.overflow = false;
                log::debug!("line parser: dropped line longer than {} bytes", N);
                return None;
            }
            return Some(line);
        }

        if !self.overflow && self.buf.push(byte).is_err() {
            self.overflow = true;
            self.buf.clear();
        }
        None
    }

    /// Discard any partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflow = false;
    }
}

impl<const N: usize> Default for LineParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn trimmed(line: &[u8]) -> Option<&str> {
    let text = core::str::from_utf8(line).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse an anemometer line into a wind speed in m/s.
///
/// Empty, non-numeric, non-finite or negative readings yield `None`.
pub fn parse_wind_speed(line: &[u8]) -> Option<f32> {
    let value: f32 = trimmed(line)?.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Parse a debug-console line.
///
/// Button labels become operator intents; a number in `[0, manual_max]` becomes a manual command.
/// Anything else yields `None`.
pub fn parse_debug_line(line: &[u8], manual_max: f32) -> Option<DebugLine> {
    let text = trimmed(line)?;

    if let Some(cmd) = Command::from_label(text) {
        return Some(DebugLine::Operator(cmd));
    }

    let value: f32 = text.parse().ok()?;
    if value >= 0.0 && value <= manual_max {
        Some(DebugLine::ManualCommand(value))
    } else {
        log::debug!("debug console: ignoring out-of-range command {}", value);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<const N: usize>(p: &mut LineParser<N>, bytes: &[u8]) -> Option<Line<N>> {
        let mut out = None;
        for &b in bytes {
            if let Some(line) = p.push(b) {
                out = Some(line);
            }
        }
        out
    }

    #[test]
    fn frames_lines_on_newline() {
        let mut p = LineParser::<32>::new();
        assert_eq!(feed(&mut p, b"12.5"), None);
        let line = feed(&mut p, b"\r\n").unwrap();
        assert_eq!(line.as_slice(), b"12.5\r");
        assert_eq!(parse_wind_speed(&line), Some(12.5));
    }

    #[test]
    fn consecutive_lines_are_independent() {
        let mut p = LineParser::<32>::new();
        let first = feed(&mut p, b"1.0\n").unwrap();
        let second = feed(&mut p, b"2.0\n").unwrap();
        assert_eq!(parse_wind_speed(&first), Some(1.0));
        assert_eq!(parse_wind_speed(&second), Some(2.0));
    }

    #[test]
    fn overlong_line_is_dropped() {
        let mut p = LineParser::<4>::new();
        assert_eq!(feed(&mut p, b"123456\n"), None);
        let line = feed(&mut p, b"7.5\n").unwrap();
        assert_eq!(parse_wind_speed(&line), Some(7.5));
    }

    #[test]
    fn wind_speed_rejects_garbage() {
        assert_eq!(parse_wind_speed(b""), None);
        assert_eq!(parse_wind_speed(b"   \r"), None);
        assert_eq!(parse_wind_speed(b"abc"), None);
        assert_eq!(parse_wind_speed(b"12.5m/s"), None);
        assert_eq!(parse_wind_speed(b"-1.0"), None);
        assert_eq!(parse_wind_speed(b"NaN"), None);
        assert_eq!(parse_wind_speed(b"inf"), None);
        assert_eq!(parse_wind_speed(&[0xFF, 0xFE]), None);
        assert_eq!(parse_wind_speed(b" 0 "), Some(0.0));
    }

    #[test]
    fn debug_line_labels() {
        assert_eq!(
            parse_debug_line(b"start", 10_000.0),
            Some(DebugLine::Operator(Command::Start))
        );
        assert_eq!(
            parse_debug_line(b"STOP\r", 10_000.0),
            Some(DebugLine::Operator(Command::Stop))
        );
        assert_eq!(
            parse_debug_line(b"set", 10_000.0),
            Some(DebugLine::Operator(Command::Commit))
        );
        assert_eq!(
            parse_debug_line(b"+", 10_000.0),
            Some(DebugLine::Operator(Command::AdjustUp))
        );
        assert_eq!(
            parse_debug_line(b" - ", 10_000.0),
            Some(DebugLine::Operator(Command::AdjustDown))
        );
    }

    #[test]
    fn debug_line_manual_range() {
        assert_eq!(
            parse_debug_line(b"4200", 10_000.0),
            Some(DebugLine::ManualCommand(4_200.0))
        );
        assert_eq!(
            parse_debug_line(b"0", 10_000.0),
            Some(DebugLine::ManualCommand(0.0))
        );
        assert_eq!(
            parse_debug_line(b"10000", 10_000.0),
            Some(DebugLine::ManualCommand(10_000.0))
        );
        assert_eq!(parse_debug_line(b"10001", 10_000.0), None);
        assert_eq!(parse_debug_line(b"-5", 10_000.0), None);
        assert_eq!(parse_debug_line(b"fast", 10_000.0), None);
        assert_eq!(parse_debug_line(b"", 10_000.0), None);
    }
}
