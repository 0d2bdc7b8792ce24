//! Simulated accelerometer - seeded synthetic motion for demos and soak runs
//!
//! Produces readings in raw driver units (engineering units × 100, i.e.
//! 981 ≈ 1 g on the z axis), cycling through a motion script.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f32::consts::TAU;

use super::{AccelerometerSource, SensorError};
use crate::types::Axes;

/// Resting gravity on the z axis, raw units.
const GRAVITY_RAW: f32 = 981.0;

/// Kind of motion the simulator is producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Device lying still: gravity plus sensor noise
    Rest,
    /// ~2 Hz gait oscillation
    Walk,
    /// Violent, unstructured motion outside any trained class
    Shake,
}

/// Synthetic 3-axis source driven by a looping motion script.
pub struct SimulatedAccelerometer {
    rng: StdRng,
    /// (motion, readings) segments, played in order and looped
    script: Vec<(Motion, u64)>,
    sample_rate_hz: f32,
    fault_rate: f64,
    /// Injected faults so far; alternates NAK and timeout
    faults: u64,
    tick: u64,
}

impl SimulatedAccelerometer {
    /// Default script: 8 s rest, 12 s walk, 3 s shake at the given rate.
    pub fn new(seed: u64, sample_rate_hz: f32) -> Self {
        let secs = |s: f32| (s * sample_rate_hz).max(1.0) as u64;
        Self {
            rng: StdRng::seed_from_u64(seed),
            script: vec![
                (Motion::Rest, secs(8.0)),
                (Motion::Walk, secs(12.0)),
                (Motion::Shake, secs(3.0)),
            ],
            sample_rate_hz,
            fault_rate: 0.0,
            faults: 0,
            tick: 0,
        }
    }

    /// Replace the motion script. Segments with zero readings are dropped.
    #[must_use]
    pub fn with_script(mut self, script: Vec<(Motion, u64)>) -> Self {
        let script: Vec<_> = script.into_iter().filter(|(_, n)| *n > 0).collect();
        if !script.is_empty() {
            self.script = script;
        }
        self
    }

    /// Fail this fraction of reads, alternating bus NAKs and timeouts.
    #[must_use]
    pub fn with_fault_rate(mut self, rate: f64) -> Self {
        self.fault_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Motion at the current position of the script.
    pub fn current_motion(&self) -> Motion {
        let period: u64 = self.script.iter().map(|(_, n)| n).sum();
        let mut pos = self.tick % period.max(1);
        for &(motion, len) in &self.script {
            if pos < len {
                return motion;
            }
            pos -= len;
        }
        Motion::Rest
    }

    fn noise(&mut self, sigma: f32) -> f32 {
        let n: f32 = self.rng.sample(StandardNormal);
        n * sigma
    }

    fn sample(&mut self, motion: Motion) -> Axes {
        let t = self.tick as f32 / self.sample_rate_hz;
        match motion {
            Motion::Rest => Axes::new(
                self.noise(2.0),
                self.noise(2.0),
                GRAVITY_RAW + self.noise(2.0),
            ),
            Motion::Walk => {
                let phase = TAU * 2.0 * t;
                Axes::new(
                    50.0 * (phase / 2.0).sin() + self.noise(10.0),
                    self.noise(10.0),
                    GRAVITY_RAW + 200.0 * phase.sin() + self.noise(10.0),
                )
            }
            Motion::Shake => Axes::new(
                self.rng.gen_range(-1500.0..1500.0),
                self.rng.gen_range(-1500.0..1500.0),
                GRAVITY_RAW + self.rng.gen_range(-1500.0..1500.0),
            ),
        }
    }
}

impl AccelerometerSource for SimulatedAccelerometer {
    fn read_axes(&mut self) -> Result<Axes, SensorError> {
        if self.fault_rate > 0.0 && self.rng.gen_bool(self.fault_rate) {
            self.faults += 1;
            return Err(if self.faults % 2 == 1 {
                SensorError::Bus("simulated I2C NAK".to_string())
            } else {
                SensorError::Timeout
            });
        }
        let motion = self.current_motion();
        let axes = self.sample(motion);
        self.tick += 1;
        Ok(axes)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimulatedAccelerometer::new(7, 50.0);
        let mut b = SimulatedAccelerometer::new(7, 50.0);
        for _ in 0..20 {
            assert_eq!(a.read_axes().unwrap(), b.read_axes().unwrap());
        }
    }

    #[test]
    fn test_script_loops() {
        let mut s = SimulatedAccelerometer::new(1, 10.0)
            .with_script(vec![(Motion::Rest, 2), (Motion::Shake, 1)]);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(s.current_motion());
            s.read_axes().unwrap();
        }
        assert_eq!(
            seen,
            vec![
                Motion::Rest,
                Motion::Rest,
                Motion::Shake,
                Motion::Rest,
                Motion::Rest,
                Motion::Shake
            ]
        );
    }

    #[test]
    fn test_rest_is_near_one_g() {
        let mut s = SimulatedAccelerometer::new(3, 50.0).with_script(vec![(Motion::Rest, 10)]);
        let a = s.read_axes().unwrap();
        assert!((a.z - GRAVITY_RAW).abs() < 20.0, "z = {}", a.z);
    }

    #[test]
    fn test_full_fault_rate_alternates_nak_and_timeout() {
        let mut s = SimulatedAccelerometer::new(3, 50.0).with_fault_rate(1.0);
        assert!(matches!(s.read_axes(), Err(SensorError::Bus(_))));
        assert!(matches!(s.read_axes(), Err(SensorError::Timeout)));
        assert!(matches!(s.read_axes(), Err(SensorError::Bus(_))));
    }
}
