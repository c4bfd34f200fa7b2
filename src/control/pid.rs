// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Discrete PID corrector for the closed-loop phase.
//!
//! The controller runs at the fixed control-cycle rate, so the gains are expressed per cycle: the
//! integral is a plain running sum of the error and the derivative is the error difference between
//! consecutive cycles. Works in `no_std` and does not allocate memory.

/// PID controller with tunable gains and integral clamping.
#[derive(Debug, Clone)]
pub struct Pid {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Derivative gain
    kd: f32,

    /// Running error sum
    integral: f32,
    /// Error from the previous update (for derivative term)
    last_error: f32,

    /// Integral anti-windup clamp
    int_min: f32,
    int_max: f32,
}

impl Pid {
    /// Create a new PID controller.
    ///
    /// `kp`, `ki`, `kd` are the gain constants. The integral is unbounded until
    /// [`with_integral_limits`](Self::with_integral_limits) is applied.
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,

            integral: 0.0,
            last_error: 0.0,

            int_min: f32::NEG_INFINITY,
            int_max: f32::INFINITY,
        }
    }

    /// Set integral limits for anti-windup.
    pub fn with_integral_limits(mut self, min: f32, max: f32) -> Self {
        self.int_min = min;
        self.int_max = max;
        self
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn last_error(&self) -> f32 {
        self.last_error
    }

    /// Update the controller with one cycle's worth of error.
    ///
    /// `setpoint`: target wind speed
    /// `measurement`: latest anemometer reading
    ///
    /// Returns the unclamped correction `kp*e + ki*sum(e) + kd*(e - e_prev)`.
    pub fn update(&mut self, setpoint: f32, measurement: f32) -> f32 {
        let error = setpoint - measurement;

        // ----- I term -----
        self.integral = (self.integral + error).clamp(self.int_min, self.int_max);

        // ----- D term -----
        let derivative = error - self.last_error;
        self.last_error = error;

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new(1.5, 0.0, 0.0);
        assert_eq!(pid.update(10.0, 8.0), 3.0);
        assert_eq!(pid.last_error(), 2.0);
    }

    #[test]
    fn integral_accumulates_per_update() {
        let mut pid = Pid::new(0.0, 0.5, 0.0);
        assert_eq!(pid.update(5.0, 4.0), 0.5);
        assert_eq!(pid.update(5.0, 4.0), 1.0);
        assert_eq!(pid.integral(), 2.0);
    }

    #[test]
    fn derivative_uses_error_difference() {
        let mut pid = Pid::new(0.0, 0.0, 2.0);
        // First update sees the full error step from the reset state.
        assert_eq!(pid.update(5.0, 3.0), 4.0);
        assert_eq!(pid.update(5.0, 4.0), -2.0);
    }

    #[test]
    fn integral_is_clamped() {
        let mut pid = Pid::new(0.0, 1.0, 0.0).with_integral_limits(-3.0, 3.0);
        for _ in 0..10 {
            pid.update(10.0, 0.0);
        }
        assert_eq!(pid.integral(), 3.0);
        for _ in 0..10 {
            pid.update(0.0, 10.0);
        }
        assert_eq!(pid.integral(), -3.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new(1.0, 1.0, 1.0);
        pid.update(3.0, 1.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
    }
}
