// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Telemetry watchdog for the anemometer link.
//!
//! There is no background timer: the lost condition is evaluated whenever [`Watchdog::is_lost`] is
//! called, so the control loop must query it at least once per cycle.

use crate::time::{elapsed_ms, Millis};

/// Default telemetry timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 2_500;

/// Link state as seen by the watchdog.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Lost,
}

/// Snapshot of the watchdog.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WatchdogStatus {
    pub last_sample_at: Millis,
    pub lost: bool,
}

pub struct Watchdog {
    timeout_ms: u32,
    last_sample_at: Millis,
    lost: bool,
}

impl Watchdog {
    /// Create a watchdog that starts CONNECTED, with `now` as the reference sample time.
    pub fn new(timeout_ms: u32, now: Millis) -> Self {
        Self {
            timeout_ms,
            last_sample_at: now,
            lost: false,
        }
    }

    /// A valid sample arrived. Clears the lost flag unconditionally.
    pub fn on_sample_received(&mut self, now: Millis) {
        if self.lost {
            log::info!("watchdog: telemetry restored");
        }
        self.last_sample_at = now;
        self.lost = false;
    }

    /// Returns true once `now - last_sample_at >= timeout`. Stays true until the next sample.
    pub fn is_lost(&mut self, now: Millis) -> bool {
        if !self.lost && elapsed_ms(now, self.last_sample_at) >= self.timeout_ms {
            self.lost = true;
            log::warn!(
                "watchdog: no telemetry for {} ms, link lost",
                elapsed_ms(now, self.last_sample_at)
            );
        }
        self.lost
    }

    #[inline]
    pub fn state(&self) -> LinkState {
        if self.lost {
            LinkState::Lost
        } else {
            LinkState::Connected
        }
    }

    #[inline]
    pub fn status(&self) -> WatchdogStatus {
        WatchdogStatus {
            last_sample_at: self.last_sample_at,
            lost: self.lost,
        }
    }

    #[inline]
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connected() {
        let mut wd = Watchdog::new(DEFAULT_TIMEOUT_MS, 0);
        assert_eq!(wd.state(), LinkState::Connected);
        assert!(!wd.is_lost(0));
        assert!(!wd.is_lost(2_499));
    }

    #[test]
    fn lost_exactly_at_timeout() {
        let mut wd = Watchdog::new(2_500, 100);
        assert!(!wd.is_lost(2_599));
        assert!(wd.is_lost(2_600));
        assert_eq!(wd.state(), LinkState::Lost);
    }

    #[test]
    fn lost_is_sticky_until_sample() {
        let mut wd = Watchdog::new(2_500, 0);
        assert!(wd.is_lost(3_000));
        // Going back in time must not clear it either.
        assert!(wd.is_lost(10));
        wd.on_sample_received(3_001);
        assert!(!wd.is_lost(3_001));
        assert_eq!(wd.status(), WatchdogStatus { last_sample_at: 3_001, lost: false });
    }

    #[test]
    fn sample_recovers_regardless_of_elapsed_time() {
        let mut wd = Watchdog::new(2_500, 0);
        assert!(wd.is_lost(1_000_000));
        wd.on_sample_received(1_000_000);
        assert!(!wd.is_lost(1_000_000));
        assert!(!wd.is_lost(1_002_499));
        assert!(wd.is_lost(1_002_500));
    }

    #[test]
    fn repeated_queries_keep_connected_state() {
        let mut wd = Watchdog::new(2_500, 0);
        for t in (0..2_500).step_by(100) {
            assert!(!wd.is_lost(t));
        }
        assert_eq!(wd.status().last_sample_at, 0);
    }

    #[test]
    fn survives_counter_wrap() {
        let start = u32::MAX - 1_000;
        let mut wd = Watchdog::new(2_500, start);
        assert!(!wd.is_lost(start.wrapping_add(2_000)));
        assert!(wd.is_lost(start.wrapping_add(2_500)));
    }
}
