//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the oracle pattern.

use std::time::Duration;

use boltlock_core::{DeviceConfig, DeviceEvent, LockDevice};
use boltlock_proto::{
    EndpointId,
    ids::{attributes, clusters},
};

use crate::{
    scenario::{OracleFn, World},
    sim_motor::SimMotor,
};

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver an event at the current virtual time.
    Event(DeviceEvent),
    /// Move the virtual clock forward.
    Advance(Duration),
    /// Jam or free the motor.
    Jam(bool),
}

/// Scenario builder.
///
/// Configure the device and motor, add steps, then call `.oracle()` to get
/// a [`RunnableScenario`].
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    config: DeviceConfig,
    motion: Duration,
    tick: Duration,
    seed: u64,
    fault_rate: f64,
    loss_rate: f64,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a scenario with the default configuration, a 500ms motor and
    /// a 50ms tick.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: DeviceConfig::default(),
            motion: Duration::from_millis(500),
            tick: Duration::from_millis(50),
            seed: 0,
            fault_rate: 0.0,
            loss_rate: 0.0,
            steps: Vec::new(),
        }
    }

    /// Use a custom device configuration.
    #[must_use]
    pub fn config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Time one motor motion takes.
    #[must_use]
    pub fn motion(mut self, motion: Duration) -> Self {
        self.motion = motion;
        self
    }

    /// Timer granularity while advancing.
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Seed for the motor's fault RNG.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fraction of motions that fail.
    #[must_use]
    pub fn fault_rate(mut self, rate: f64) -> Self {
        self.fault_rate = rate;
        self
    }

    /// Fraction of motions whose completion is lost.
    #[must_use]
    pub fn loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate;
        self
    }

    /// Deliver an arbitrary event.
    #[must_use]
    pub fn event(mut self, event: DeviceEvent) -> Self {
        self.steps.push(Step::Event(event));
        self
    }

    /// Lock command without a PIN.
    #[must_use]
    pub fn lock(self, endpoint: EndpointId) -> Self {
        self.event(DeviceEvent::LockCommand { endpoint, pin: None })
    }

    /// Unlock command without a PIN.
    #[must_use]
    pub fn unlock(self, endpoint: EndpointId) -> Self {
        self.event(DeviceEvent::UnlockCommand { endpoint, pin: None })
    }

    /// Unlock command with a PIN.
    #[must_use]
    pub fn unlock_with_pin(self, endpoint: EndpointId, pin: &str) -> Self {
        self.event(DeviceEvent::UnlockCommand { endpoint, pin: Some(pin.as_bytes().to_vec()) })
    }

    /// Write the On/Off attribute.
    #[must_use]
    pub fn write_on_off(self, endpoint: EndpointId, value: u8) -> Self {
        self.event(DeviceEvent::AttributeChanged {
            cluster: clusters::ON_OFF,
            endpoint,
            attribute: attributes::ON_OFF,
            value: vec![value],
        })
    }

    /// Move the virtual clock forward.
    #[must_use]
    pub fn advance(mut self, by: Duration) -> Self {
        self.steps.push(Step::Advance(by));
        self
    }

    /// Advance far enough for one motion to finish.
    #[must_use]
    pub fn settle(self) -> Self {
        let motion = self.motion;
        self.advance(motion)
    }

    /// Jam the motor: motions started from now on never report back.
    #[must_use]
    pub fn jam(mut self) -> Self {
        self.steps.push(Step::Jam(true));
        self
    }

    /// Free a jammed motor.
    #[must_use]
    pub fn unjam(mut self) -> Self {
        self.steps.push(Step::Jam(false));
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory; a scenario cannot run without verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the steps, then run the oracle against the final world.
    pub fn run(self) -> Result<(), String> {
        let world = self.execute()?;
        (self.oracle)(&world).map_err(|e| format!("Scenario '{}': {e}", self.scenario.name))
    }

    /// Execute the steps and hand back the final world without judging it.
    fn execute(&self) -> Result<World, String> {
        let scenario = &self.scenario;
        let device = LockDevice::new(scenario.config.clone())
            .map_err(|e| format!("Scenario '{}': invalid config: {e}", scenario.name))?;
        let motor = SimMotor::new(scenario.motion, scenario.seed)
            .with_fault_rate(scenario.fault_rate)
            .with_loss_rate(scenario.loss_rate);

        let mut world = World::new(device, motor, scenario.tick);
        tracing::debug!(name = %scenario.name, steps = scenario.steps.len(), "running scenario");

        for step in &scenario.steps {
            match step {
                Step::Event(event) => world.apply(event.clone()),
                Step::Advance(by) => world.advance(*by),
                Step::Jam(jammed) => world.motor_mut().set_jammed(*jammed),
            }
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use boltlock_core::{ConfigError, LockState};

    use super::*;

    #[test]
    fn scenario_requires_oracle() {
        // Compiles only because an oracle is provided; `Scenario` has no `run`.
        let _scenario = Scenario::new("test").lock(1).oracle(Box::new(|_world| Ok(())));
    }

    #[test]
    fn scenario_runs_steps_in_order() {
        let result = Scenario::new("unlock then settle")
            .unlock(1)
            .settle()
            .oracle(Box::new(|world| {
                assert_eq!(world.device().state(), LockState::Unlocked);
                assert_eq!(world.drives().len(), 1);
                Ok(())
            }))
            .run();

        assert!(result.is_ok(), "scenario should succeed: {result:?}");
    }

    #[test]
    fn invalid_config_fails_before_steps() {
        let config = DeviceConfig { user_slots: 0, ..Default::default() };
        let result = Scenario::new("bad config").config(config).oracle(Box::new(|_| Ok(()))).run();

        let err = result.unwrap_err();
        assert!(err.contains(&ConfigError::NoUserSlots.to_string()), "{err}");
    }

    #[test]
    fn oracle_failure_names_scenario() {
        let result = Scenario::new("always fails").oracle(Box::new(|_| Err("nope".into()))).run();
        assert_eq!(result, Err("Scenario 'always fails': nope".to_string()));
    }
}
