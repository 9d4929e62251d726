//! Simulated bolt motor.
//!
//! Every started motion takes a fixed virtual time. Outcomes are drawn from
//! a seeded ChaCha RNG, so a given seed always produces the same sequence of
//! faults and lost completions.

use std::time::{Duration, Instant};

use boltlock_core::{ActionRequest, RequestId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A finished motion reported by the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCompletion {
    /// Request the motor was driving
    pub request: RequestId,
    /// Whether the bolt reached its target
    pub success: bool,
}

/// Virtual bolt motor.
#[derive(Debug, Clone)]
pub struct SimMotor {
    motion: Duration,
    fault_rate: f64,
    loss_rate: f64,
    jammed: bool,
    rng: ChaCha8Rng,
    pending: Vec<(Instant, MotorCompletion)>,
    started: usize,
}

impl SimMotor {
    /// Motor that always succeeds after `motion`.
    #[must_use]
    pub fn new(motion: Duration, seed: u64) -> Self {
        Self {
            motion,
            fault_rate: 0.0,
            loss_rate: 0.0,
            jammed: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending: Vec::new(),
            started: 0,
        }
    }

    /// Fraction of motions that complete with failure.
    #[must_use]
    pub fn with_fault_rate(mut self, rate: f64) -> Self {
        self.fault_rate = probability(rate);
        self
    }

    /// Fraction of motions whose completion is never reported.
    #[must_use]
    pub fn with_loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = probability(rate);
        self
    }

    /// While jammed, started motions never report back.
    pub fn set_jammed(&mut self, jammed: bool) {
        self.jammed = jammed;
    }

    /// Time one motion takes.
    #[must_use]
    pub fn motion(&self) -> Duration {
        self.motion
    }

    /// Begin driving the bolt for `request`.
    pub fn start(&mut self, request: &ActionRequest, now: Instant) {
        self.started += 1;

        if self.jammed || self.rng.gen_bool(self.loss_rate) {
            tracing::debug!(request = %request.id, "motor completion lost");
            return;
        }

        let success = !self.rng.gen_bool(self.fault_rate);
        self.pending.push((now + self.motion, MotorCompletion { request: request.id, success }));
    }

    /// Completions due at `now`, oldest first.
    pub fn poll(&mut self, now: Instant) -> Vec<MotorCompletion> {
        let mut due = Vec::new();
        self.pending.retain(|(deadline, completion)| {
            if *deadline <= now {
                due.push((*deadline, *completion));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, completion)| completion).collect()
    }

    /// Earliest pending completion time.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(deadline, _)| *deadline).min()
    }

    /// Motions started so far.
    #[must_use]
    pub fn started(&self) -> usize {
        self.started
    }

    /// Motions still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Clamp `rate` into `[0, 1]`; NaN means never.
fn probability(rate: f64) -> f64 {
    if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use boltlock_core::{LockAction, TriggerSource};

    use super::*;

    fn request(id: u64) -> ActionRequest {
        ActionRequest {
            id: RequestId(id),
            action: LockAction::Lock,
            source: TriggerSource::ExplicitCommand,
            endpoint: 1,
        }
    }

    #[test]
    fn completes_after_motion_time() {
        let t0 = Instant::now();
        let mut motor = SimMotor::new(Duration::from_millis(500), 7);
        motor.start(&request(1), t0);

        assert!(motor.poll(t0 + Duration::from_millis(499)).is_empty());
        assert_eq!(
            motor.poll(t0 + Duration::from_millis(500)),
            vec![MotorCompletion { request: RequestId(1), success: true }]
        );
        assert_eq!(motor.pending(), 0);
    }

    #[test]
    fn jammed_motor_never_reports() {
        let t0 = Instant::now();
        let mut motor = SimMotor::new(Duration::from_millis(500), 7);
        motor.set_jammed(true);
        motor.start(&request(1), t0);

        assert_eq!(motor.started(), 1);
        assert!(motor.poll(t0 + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn full_fault_rate_always_fails() {
        let t0 = Instant::now();
        let mut motor = SimMotor::new(Duration::from_millis(10), 7).with_fault_rate(1.0);
        motor.start(&request(1), t0);

        let done = motor.poll(t0 + Duration::from_millis(10));
        assert_eq!(done.len(), 1);
        assert!(!done[0].success);
    }

    #[test]
    fn nan_rates_never_trigger() {
        let t0 = Instant::now();
        let mut motor =
            SimMotor::new(Duration::from_millis(10), 7).with_fault_rate(f64::NAN).with_loss_rate(f64::NAN);
        (1..=8).for_each(|id| motor.start(&request(id), t0));

        let done = motor.poll(t0 + Duration::from_millis(10));
        assert_eq!(done.len(), 8);
        assert!(done.iter().all(|completion| completion.success));
    }

    #[test]
    fn same_seed_same_outcomes() {
        let t0 = Instant::now();
        let run = |seed| {
            let mut motor = SimMotor::new(Duration::from_millis(10), seed).with_fault_rate(0.5);
            (1..=32).for_each(|id| motor.start(&request(id), t0));
            motor.poll(t0 + Duration::from_millis(10))
        };

        assert_eq!(run(42), run(42));
    }
}
