//! World state for scenario execution.
//!
//! The world owns the device, the virtual clock and the simulated motor. It
//! executes the device's actions the way a runtime would and records every
//! action in a trace for oracles to inspect.

use std::time::Duration;

use boltlock_core::{
    ActionOutcome, ActionRequest, DeviceAction, DeviceEvent, LockDevice, LockState, Notification,
    Response,
};

use crate::{sim_clock::SimClock, sim_motor::SimMotor};

/// Device plus its simulated surroundings.
#[derive(Debug)]
pub struct World {
    device: LockDevice,
    clock: SimClock,
    motor: SimMotor,
    tick: Duration,
    trace: Vec<DeviceAction>,
}

impl World {
    /// Create a world. `tick` is the timer granularity used by
    /// [`advance`](Self::advance); it is raised to at least 1ms.
    #[must_use]
    pub fn new(device: LockDevice, motor: SimMotor, tick: Duration) -> Self {
        Self {
            device,
            clock: SimClock::new(),
            motor,
            tick: tick.max(Duration::from_millis(1)),
            trace: Vec::new(),
        }
    }

    /// Deliver one event at the current virtual time.
    pub fn apply(&mut self, event: DeviceEvent) {
        let actions = self.device.handle(event, self.clock.now());
        self.execute(actions);
    }

    /// Move the clock forward, delivering motor completions and timer ticks
    /// as they fall due.
    pub fn advance(&mut self, by: Duration) {
        let target = self.clock.elapsed() + by;

        while self.clock.elapsed() < target {
            let step = self.tick.min(target - self.clock.elapsed());
            self.clock.advance(step);

            for completion in self.motor.poll(self.clock.now()) {
                self.apply(DeviceEvent::ActuatorComplete {
                    request: completion.request,
                    success: completion.success,
                });
            }
            self.apply(DeviceEvent::Tick);
        }
    }

    fn execute(&mut self, actions: Vec<DeviceAction>) {
        for action in actions {
            if let DeviceAction::DriveBolt(request) = &action {
                self.motor.start(request, self.clock.now());
            }
            self.trace.push(action);
        }
    }

    /// The device under test.
    #[must_use]
    pub fn device(&self) -> &LockDevice {
        &self.device
    }

    /// The simulated motor.
    pub fn motor_mut(&mut self) -> &mut SimMotor {
        &mut self.motor
    }

    /// The simulated motor.
    #[must_use]
    pub fn motor(&self) -> &SimMotor {
        &self.motor
    }

    /// The virtual clock.
    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Every action the device produced, in order.
    #[must_use]
    pub fn trace(&self) -> &[DeviceAction] {
        &self.trace
    }

    /// Motions the device asked for.
    pub fn drives(&self) -> Vec<ActionRequest> {
        self.trace
            .iter()
            .filter_map(|a| match a {
                DeviceAction::DriveBolt(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    /// Published notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.trace
            .iter()
            .filter_map(|a| match a {
                DeviceAction::Notify(notification) => Some(*notification),
                _ => None,
            })
            .collect()
    }

    /// Published lock states, in order.
    pub fn state_history(&self) -> Vec<LockState> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::LockStateChanged { state } => Some(state),
                Notification::ActionResult { .. } => None,
            })
            .collect()
    }

    /// Finished motions and how they ended.
    pub fn action_results(&self) -> Vec<(ActionRequest, ActionOutcome)> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::ActionResult { request, outcome, .. } => Some((request, outcome)),
                Notification::LockStateChanged { .. } => None,
            })
            .collect()
    }

    /// Replies to bus requests.
    pub fn responses(&self) -> Vec<&Response> {
        self.trace
            .iter()
            .filter_map(|a| match a {
                DeviceAction::Respond(response) => Some(response),
                _ => None,
            })
            .collect()
    }

    /// Most recent reply.
    #[must_use]
    pub fn last_response(&self) -> Option<&Response> {
        self.trace.iter().rev().find_map(|a| match a {
            DeviceAction::Respond(response) => Some(response),
            _ => None,
        })
    }
}
