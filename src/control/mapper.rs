// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Setpoint to motor command mapping.
//!
//! The tunnel's fans are characterised by a calibration table of (wind speed, command) pairs. The
//! mapper interpolates linearly between neighbouring points and clamps outside the table, giving
//! the open-loop feed-forward term used by the [`Governor`](crate::control::Governor).

use heapless::Vec;

/// Maximum number of calibration points a table can hold.
pub const MAX_POINTS: usize = 16;

/// Error type for calibration table construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Fewer than two points; at least one segment is required.
    TooFewPoints,
    /// More than [`MAX_POINTS`] points.
    TooManyPoints,
    /// Setpoints must be strictly increasing. Carries the index of the offending point.
    NotIncreasing(usize),
    /// A setpoint or command is NaN or infinite. Carries the index of the offending point.
    NonFinite(usize),
}

/// One calibration point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Wind speed in m/s.
    pub setpoint: f32,
    /// Motor command in drive counts.
    pub command: f32,
}

impl CalibrationPoint {
    pub const fn new(setpoint: f32, command: f32) -> Self {
        Self { setpoint, command }
    }
}

/// Immutable, validated calibration table.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint, MAX_POINTS>,
}

impl CalibrationTable {
    /// Build a table from `points`, checking the ordering invariants.
    pub fn new(points: &[CalibrationPoint]) -> Result<Self, Error> {
        if points.len() < 2 {
            return Err(Error::TooFewPoints);
        }

        let mut table = Vec::new();
        for (i, p) in points.iter().enumerate() {
            if !p.setpoint.is_finite() || !p.command.is_finite() {
                return Err(Error::NonFinite(i));
            }
            if i > 0 && p.setpoint <= points[i - 1].setpoint {
                return Err(Error::NotIncreasing(i));
            }
            table.push(*p).map_err(|_| Error::TooManyPoints)?;
        }

        Ok(Self { points: table })
    }

    /// Build a table from `(setpoint, command)` pairs.
    pub fn from_pairs(pairs: &[(f32, f32)]) -> Result<Self, Error> {
        let mut points: Vec<CalibrationPoint, MAX_POINTS> = Vec::new();
        for &(s, c) in pairs {
            points
                .push(CalibrationPoint::new(s, c))
                .map_err(|_| Error::TooManyPoints)?;
        }
        Self::new(&points)
    }

    #[inline]
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Smallest and largest setpoint covered by the table.
    pub fn range(&self) -> (f32, f32) {
        (self.first().setpoint, self.last().setpoint)
    }

    #[inline]
    fn first(&self) -> &CalibrationPoint {
        &self.points[0]
    }

    #[inline]
    fn last(&self) -> &CalibrationPoint {
        &self.points[self.points.len() - 1]
    }

    /// Map a wind-speed setpoint (m/s) to a motor command.
    ///
    /// Inputs at or below the first setpoint return the first command, inputs at or above the last
    /// setpoint return the last command. A knot belongs to the segment starting at it, so the
    /// result is exact at every table point.
    pub fn map(&self, setpoint: f32) -> f32 {
        let first = self.first();
        let last = self.last();

        // NaN fails every comparison below; pin it to the low end.
        if setpoint.is_nan() || setpoint <= first.setpoint {
            return first.command;
        }
        if setpoint >= last.setpoint {
            return last.command;
        }

        for seg in self.points.windows(2) {
            let (lo, hi) = (seg[0], seg[1]);
            if setpoint >= lo.setpoint && setpoint < hi.setpoint {
                let frac = (setpoint - lo.setpoint) / (hi.setpoint - lo.setpoint);
                return lo.command + frac * (hi.command - lo.command);
            }
        }

        last.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CalibrationTable {
        CalibrationTable::from_pairs(&[(0.0, 0.0), (3.0, 10.0), (6.0, 20.0)]).unwrap()
    }

    #[test]
    fn interpolates_inside_segment() {
        assert_eq!(table().map(4.5), 15.0);
        assert_eq!(table().map(1.5), 5.0);
    }

    #[test]
    fn exact_at_knots() {
        let t = table();
        assert_eq!(t.map(0.0), 0.0);
        assert_eq!(t.map(3.0), 10.0);
        assert_eq!(t.map(6.0), 20.0);
    }

    #[test]
    fn clamps_outside_range() {
        let t = table();
        assert_eq!(t.map(-4.0), 0.0);
        assert_eq!(t.map(100.0), 20.0);
        assert_eq!(t.map(f32::NEG_INFINITY), 0.0);
        assert_eq!(t.map(f32::INFINITY), 20.0);
        assert_eq!(t.map(f32::NAN), 0.0);
    }

    #[test]
    fn single_segment_table() {
        let t = CalibrationTable::from_pairs(&[(2.0, 100.0), (4.0, 300.0)]).unwrap();
        assert_eq!(t.map(3.0), 200.0);
        assert_eq!(t.map(1.0), 100.0);
        assert_eq!(t.map(5.0), 300.0);
    }

    #[test]
    fn monotone_for_monotone_commands() {
        let t = table();
        let mut prev = t.map(-1.0);
        let mut x = -1.0;
        while x <= 7.0 {
            let y = t.map(x);
            assert!(y >= prev, "map({}) = {} < {}", x, y, prev);
            prev = y;
            x += 0.05;
        }
    }

    #[test]
    fn continuous_across_knots() {
        let t = table();
        let eps = 1e-4;
        assert!((t.map(3.0 - eps) - t.map(3.0)).abs() < 1e-2);
        assert!((t.map(3.0 + eps) - t.map(3.0)).abs() < 1e-2);
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(
            CalibrationTable::from_pairs(&[(1.0, 1.0)]).unwrap_err(),
            Error::TooFewPoints
        );
        assert_eq!(
            CalibrationTable::from_pairs(&[(0.0, 0.0), (3.0, 1.0), (3.0, 2.0)]).unwrap_err(),
            Error::NotIncreasing(2)
        );
        assert_eq!(
            CalibrationTable::from_pairs(&[(0.0, 0.0), (f32::NAN, 1.0)]).unwrap_err(),
            Error::NonFinite(1)
        );

        let mut many = [(0.0f32, 0.0f32); MAX_POINTS + 1];
        for (i, p) in many.iter_mut().enumerate() {
            *p = (i as f32, i as f32);
        }
        assert_eq!(
            CalibrationTable::from_pairs(&many).unwrap_err(),
            Error::TooManyPoints
        );
    }
}
