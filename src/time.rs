// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond time base shared by every timer in the governor.
//!
//! All timestamps come from a single free-running 32-bit millisecond counter. The counter wraps
//! after ~49.7 days, so elapsed time is always computed with wrapping subtraction.

/// Timestamp in milliseconds since boot.
pub type Millis = u32;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Milliseconds elapsed from `since` to `now`, tolerant of counter wrap.
#[inline]
pub fn elapsed_ms(now: Millis, since: Millis) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_handles_wrap() {
        assert_eq!(elapsed_ms(1_000, 400), 600);
        assert_eq!(elapsed_ms(5, u32::MAX - 4), 10);
    }
}
