//! Simulated conveyor belt state shared by the RT task set.
//!
//! One mutex guards three scalars. Every critical section is a handful of
//! arithmetic operations, which is what bounds priority-inversion blocking
//! for the tasks that contend here.

use std::sync::Mutex;

/// Initial setpoint at startup, rpm.
pub const SETPOINT_INITIAL: f64 = 120.0;

/// HMI setpoint step per keypress, rpm.
pub const SETPOINT_STEP: f64 = 20.0;

/// Above this the HMI bump wraps back to [`SETPOINT_INITIAL`].
pub const SETPOINT_WRAP: f64 = 500.0;

// Fraction of the setpoint error the belt closes per sampler period.
const TRACK_GAIN: f64 = 0.05;

#[derive(Clone, Copy, Debug)]
pub struct BeltState {
    /// Measured speed, rpm.
    pub rpm: f64,
    /// Commanded speed, rpm.
    pub setpoint: f64,
    /// Integrated position, belt revolutions.
    pub position: f64,
}

pub struct Belt {
    state: Mutex<BeltState>,
}

impl Belt {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BeltState {
                rpm: 0.0,
                setpoint: SETPOINT_INITIAL,
                position: 0.0,
            }),
        }
    }

    /// One sampler step: first-order pull of the measured speed toward the
    /// setpoint plus position integration over `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        let mut s = self.state.lock().unwrap();
        s.rpm += (s.setpoint - s.rpm) * TRACK_GAIN;
        s.position += s.rpm / 60.0 * dt_s;
    }

    /// Runs one bounded PI update against the live state.
    ///
    /// A zero setpoint inhibits the drive entirely (e-stop latch): the
    /// integrator is discharged and the speed held at zero, so a stopped
    /// belt stays stopped until the setpoint is raised again.
    pub fn control(&self, pi: &mut PiController, dt_s: f64) {
        let mut s = self.state.lock().unwrap();
        if s.setpoint == 0.0 {
            pi.reset();
            s.rpm = 0.0;
            return;
        }
        let u = pi.update(s.setpoint - s.rpm, dt_s);
        s.rpm += u * dt_s;
    }

    /// Emergency stop: zeroes both the setpoint and the measured speed.
    pub fn estop(&self) {
        let mut s = self.state.lock().unwrap();
        s.setpoint = 0.0;
        s.rpm = 0.0;
    }

    /// HMI setpoint bump: +20 rpm, wrapping to 120 above 500. Returns the
    /// new setpoint.
    pub fn bump_setpoint(&self) -> f64 {
        let mut s = self.state.lock().unwrap();
        s.setpoint += SETPOINT_STEP;
        if s.setpoint > SETPOINT_WRAP {
            s.setpoint = SETPOINT_INITIAL;
        }
        s.setpoint
    }

    pub fn snapshot(&self) -> BeltState {
        *self.state.lock().unwrap()
    }
}

impl Default for Belt {
    fn default() -> Self {
        Self::new()
    }
}

/// PI speed controller with an anti-windup clamp on the integrator.
pub struct PiController {
    kp: f64,
    ki: f64,
    integrator: f64,
    integrator_limit: f64,
}

impl PiController {
    pub fn new(kp: f64, ki: f64, integrator_limit: f64) -> Self {
        Self {
            kp,
            ki,
            integrator: 0.0,
            integrator_limit,
        }
    }

    /// Defaults tuned for the simulated belt dynamics.
    pub fn belt_default() -> Self {
        Self::new(0.8, 0.4, 200.0)
    }

    /// Discharges the integrator.
    pub fn reset(&mut self) {
        self.integrator = 0.0;
    }

    fn update(&mut self, error: f64, dt_s: f64) -> f64 {
        self.integrator += error * dt_s;
        self.integrator = self
            .integrator
            .clamp(-self.integrator_limit, self.integrator_limit);
        self.kp * error + self.ki * self.integrator
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_advance_tracks_setpoint() {
        let belt = Belt::new();
        for _ in 0..200 {
            belt.advance(0.005);
        }
        let s = belt.snapshot();
        assert!((s.rpm - SETPOINT_INITIAL).abs() < 1.0);
        assert!(s.position > 0.0);
    }

    #[test]
    fn test_estop_zeroes_speed_and_setpoint() {
        let belt = Belt::new();
        belt.advance(0.005);
        belt.estop();
        let s = belt.snapshot();
        assert_eq!(s.rpm, 0.0);
        assert_eq!(s.setpoint, 0.0);
    }

    #[test]
    fn test_setpoint_wraps_above_500() {
        let belt = Belt::new();
        let mut last = SETPOINT_INITIAL;
        // 120 -> 140 -> ... -> 500 -> wrap to 120.
        for _ in 0..19 {
            last = belt.bump_setpoint();
        }
        assert_eq!(last, 500.0);
        assert_eq!(belt.bump_setpoint(), SETPOINT_INITIAL);
    }

    #[test]
    fn test_pi_integrator_clamps() {
        let mut pi = PiController::new(1.0, 1.0, 10.0);
        for _ in 0..10_000 {
            pi.update(100.0, 0.005);
        }
        assert!(pi.integrator <= 10.0);
    }
}
