//! PID controller for boiler temperature.
//!
//! Proportional-integral-derivative law with output clamping,
//! anti-windup, and sample-time gating: the output is re-evaluated at
//! most once per sample period and held in between, so the caller may
//! invoke [`compute`](Pid::compute) on every control tick without
//! re-deriving the sample cadence itself.

/// PID controller.
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    target: f32,
    integral: f32,
    prev_error: Option<f32>,
    output: f32,
    out_min: f32,
    out_max: f32,
    sample_ms: u64,
    last_eval_ms: Option<u64>,
}

impl Pid {
    pub fn new(kp: f32, ki: f32, kd: f32, target: f32, sample_ms: u64) -> Self {
        Self {
            kp,
            ki,
            kd,
            target,
            integral: 0.0,
            prev_error: None,
            output: 0.0,
            out_min: 0.0,
            out_max: 100.0,
            sample_ms: sample_ms.max(1),
            last_eval_ms: None,
        }
    }

    /// Set output limits. The held output is re-clamped immediately.
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.out_min = min;
        self.out_max = max;
        self.output = self.output.clamp(min, max);
    }

    /// Update the target value.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Set gains directly: proportional Kp, integral Ki, derivative Kd.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Set gains in physical form: gain Kp, integral time Tn (s),
    /// derivative time Tv (s). `Tn == 0` disables the integral term
    /// instead of dividing by zero.
    pub fn set_tunings_physical(&mut self, kp: f32, tn: f32, tv: f32) {
        let ki = if tn.abs() < f32::EPSILON { 0.0 } else { kp / tn };
        self.set_tunings(kp, ki, kp * tv);
    }

    /// Evaluate the controller against `measurement` at time `now_ms`.
    ///
    /// Returns the held output unchanged if less than one sample period
    /// has elapsed since the previous evaluation. The first evaluation
    /// uses one nominal sample period as its timestep.
    pub fn compute(&mut self, measurement: f32, now_ms: u64) -> f32 {
        let dt = match self.last_eval_ms {
            Some(last) => {
                let dt_ms = now_ms.saturating_sub(last);
                if dt_ms < self.sample_ms {
                    return self.output;
                }
                dt_ms as f32 / 1000.0
            }
            None => self.sample_ms as f32 / 1000.0,
        };

        let error = self.target - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral
        self.integral += error * dt;
        let i = self.ki * self.integral;

        // Derivative
        let derivative = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        let d = self.kd * derivative;

        self.prev_error = Some(error);

        let output = (p + i + d).clamp(self.out_min, self.out_max);

        // Anti-windup: if the output is saturated, stop integrating
        if output >= self.out_max || output <= self.out_min {
            self.integral -= error * dt;
        }

        self.last_eval_ms = Some(now_ms);
        self.output = output;
        output
    }

    /// Reset controller state (integral and derivative history).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.last_eval_ms = None;
    }

    /// Accumulated integral term, exposed for dropout-behaviour tests
    /// and diagnostics.
    pub fn integral(&self) -> f32 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_held_between_sample_periods() {
        let mut pid = Pid::new(2.0, 0.0, 0.0, 100.0, 100);
        let first = pid.compute(90.0, 0);
        // 50 ms later: under one sample period, output must not move
        // even though the measurement did.
        let held = pid.compute(50.0, 50);
        assert!((held - first).abs() < f32::EPSILON);
        // 100 ms later: re-evaluates.
        let next = pid.compute(50.0, 100);
        assert!(next > first);
    }

    #[test]
    fn proportional_only_tracks_error() {
        let mut pid = Pid::new(2.0, 0.0, 0.0, 100.0, 100);
        pid.set_limits(0.0, 1000.0);
        let out = pid.compute(90.0, 0);
        assert!((out - 20.0).abs() < 1e-3);
    }

    #[test]
    fn output_respects_limits() {
        let mut pid = Pid::new(1000.0, 0.0, 0.0, 100.0, 100);
        pid.set_limits(0.0, 1000.0);
        assert!((pid.compute(0.0, 0) - 1000.0).abs() < f32::EPSILON);
        assert!(pid.compute(200.0, 100).abs() < f32::EPSILON);
    }

    #[test]
    fn physical_and_gain_forms_agree() {
        let mut a = Pid::new(0.0, 0.0, 0.0, 96.0, 100);
        let mut b = Pid::new(0.0, 0.0, 0.0, 96.0, 100);
        a.set_tunings(69.0, 69.0 / 399.0, 69.0 * 2.0);
        b.set_tunings_physical(69.0, 399.0, 2.0);

        for (t, m) in [(0_u64, 90.0_f32), (100, 91.0), (200, 92.5), (300, 94.0)] {
            let ya = a.compute(m, t);
            let yb = b.compute(m, t);
            assert!((ya - yb).abs() < 1e-4, "diverged at t={t}: {ya} vs {yb}");
        }
    }

    #[test]
    fn zero_integral_time_disables_integral() {
        let mut pid = Pid::new(0.0, 0.0, 0.0, 100.0, 100);
        pid.set_tunings_physical(2.0, 0.0, 0.0);
        pid.set_limits(0.0, 1000.0);
        let first = pid.compute(90.0, 0);
        // With Ki forced to 0 the output must not creep over time.
        let later = pid.compute(90.0, 10_000);
        assert!((first - later).abs() < f32::EPSILON);
    }

    #[test]
    fn antiwindup_bounds_integral_under_saturation() {
        let mut pid = Pid::new(1.0, 10.0, 0.0, 100.0, 100);
        pid.set_limits(0.0, 100.0);
        for t in 0..100 {
            pid.compute(0.0, t * 100);
        }
        // Saturated the whole time: the integral must not have grown
        // without bound.
        let before = pid.integral();
        pid.compute(0.0, 10_100);
        assert!((pid.integral() - before).abs() < 1.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new(1.0, 1.0, 1.0, 100.0, 100);
        pid.compute(50.0, 0);
        pid.compute(60.0, 100);
        pid.reset();
        assert!(pid.integral().abs() < f32::EPSILON);
    }
}
