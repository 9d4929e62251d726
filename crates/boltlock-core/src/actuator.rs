//! Lock actuator state machine.
//!
//! Owns the lock state and serializes bolt motion: at most one action is in
//! flight at a time, and the machine is in a transitional state exactly
//! while one is.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods never touch hardware; they return [`ActuatorAction`]s
//! - The driver executes `DriveBolt` and later reports the motor's result
//!   through [`ActuatorStateMachine::on_actuator_complete`]
//! - `StateChanged` and `ActionResult` are for the bus layer to publish
//!
//! # State Machine
//!
//! ```text
//!              initiate(Unlock)               complete(ok)
//!   ┌────────┐ ──────────────> ┌───────────┐ ──────────────> ┌──────────┐
//!   │ Locked │                 │ Unlocking │                 │ Unlocked │
//!   └────────┘ <────────────── └───────────┘                 └──────────┘
//!     ▲  ▲      complete(fail)                                  │  ▲
//!     │  │                     ┌───────────┐  initiate(Lock)    │  │
//!     │  └──────────────────── │  Locking  │ <──────────────────┘  │
//!     │       complete(ok)     └───────────┘ ──────────────────────┘
//!     │                                        complete(fail)
//!     └── initiate(Lock) while Locked: AlreadyInState, no transition
//! ```
//!
//! # Concurrency policy
//!
//! A request arriving while the bolt is moving is rejected with
//! [`InitiateOutcome::Busy`]. Nothing is queued and no trigger source has
//! priority: whichever request arrives first moves the bolt.

use std::fmt;

use boltlock_proto::EndpointId;
use serde::{Deserialize, Serialize};

use crate::{config::BootState, error::ActuatorError};

/// Lock state as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Bolt thrown
    Locked,
    /// Bolt retracted
    Unlocked,
    /// Bolt moving towards `Locked`
    Locking,
    /// Bolt moving towards `Unlocked`
    Unlocking,
}

impl LockState {
    /// Whether the bolt is in motion.
    #[must_use]
    pub const fn is_transitional(self) -> bool {
        matches!(self, Self::Locking | Self::Unlocking)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Locking => "locking",
            Self::Unlocking => "unlocking",
        };
        f.write_str(name)
    }
}

/// Requested bolt motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockAction {
    /// Throw the bolt
    Lock,
    /// Retract the bolt
    Unlock,
}

impl LockAction {
    /// State while this action is in progress.
    #[must_use]
    pub const fn transitional_state(self) -> LockState {
        match self {
            Self::Lock => LockState::Locking,
            Self::Unlock => LockState::Unlocking,
        }
    }

    /// State once this action has completed.
    #[must_use]
    pub const fn target_state(self) -> LockState {
        match self {
            Self::Lock => LockState::Locked,
            Self::Unlock => LockState::Unlocked,
        }
    }
}

/// Where a request came from. Recorded for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Write to the On/Off attribute
    AttributeWrite,
    /// Explicit lock or unlock command
    ExplicitCommand,
    /// Auto-relock timer
    AutoRelock,
}

/// Identifier of a started action, unique for the machine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The action currently moving the bolt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionRequest {
    /// Identifier assigned when the action started
    pub id: RequestId,
    /// Requested motion
    pub action: LockAction,
    /// Origin of the request
    pub source: TriggerSource,
    /// Endpoint the request was addressed to
    pub endpoint: EndpointId,
}

/// Immediate result of [`ActuatorStateMachine::initiate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiateOutcome {
    /// Bolt motion started.
    Started(RequestId),
    /// The lock is already in the requested state; nothing to do.
    AlreadyInState,
    /// Another motion is in progress; request rejected.
    Busy,
}

/// Final result of a started action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The bolt reached the target position.
    Completed,
    /// The motor reported failure (or never reported); the lock fell back
    /// to its previous stable state.
    Fault,
}

/// Actions returned by the actuator state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorAction {
    /// Start moving the bolt for this request.
    DriveBolt(ActionRequest),

    /// The lock state changed; publish it.
    StateChanged(LockState),

    /// A started request finished; report it.
    ActionResult {
        /// The finished request
        request: ActionRequest,
        /// How it finished
        outcome: ActionOutcome,
    },
}

/// Lock actuator state machine.
///
/// One instance per physical bolt, owned by whoever owns the device.
#[derive(Debug, Clone)]
pub struct ActuatorStateMachine {
    state: LockState,
    in_flight: Option<ActionRequest>,
    next_request: u64,
}

impl ActuatorStateMachine {
    /// Create a machine resting in the configured boot state.
    #[must_use]
    pub fn new(boot: BootState) -> Self {
        Self { state: boot.into(), in_flight: None, next_request: 1 }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    /// The request currently moving the bolt, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&ActionRequest> {
        self.in_flight.as_ref()
    }

    /// Request a bolt motion.
    ///
    /// Returns immediately. On `Started`, the returned actions contain the
    /// transitional `StateChanged` and a `DriveBolt` for the driver; the
    /// motion finishes when the driver calls
    /// [`on_actuator_complete`](Self::on_actuator_complete).
    pub fn initiate(
        &mut self,
        action: LockAction,
        source: TriggerSource,
        endpoint: EndpointId,
    ) -> (InitiateOutcome, Vec<ActuatorAction>) {
        match (self.state, action) {
            (LockState::Locked, LockAction::Lock) | (LockState::Unlocked, LockAction::Unlock) => {
                tracing::debug!(state = %self.state, ?action, ?source, "already in requested state");
                (InitiateOutcome::AlreadyInState, Vec::new())
            },
            (LockState::Locked, LockAction::Unlock) | (LockState::Unlocked, LockAction::Lock) => {
                let request = ActionRequest { id: self.allocate_id(), action, source, endpoint };
                self.state = action.transitional_state();
                self.in_flight = Some(request);

                tracing::info!(request = %request.id, ?action, ?source, endpoint, "actuator started");
                (
                    InitiateOutcome::Started(request.id),
                    vec![ActuatorAction::StateChanged(self.state), ActuatorAction::DriveBolt(request)],
                )
            },
            (LockState::Locking | LockState::Unlocking, _) => {
                tracing::info!(state = %self.state, ?action, ?source, endpoint, "actuator busy");
                (InitiateOutcome::Busy, Vec::new())
            },
        }
    }

    /// Report the end of the motion for `request`.
    ///
    /// On success the lock settles in the action's target state; on failure
    /// it returns to the stable state it left. Either way the request is
    /// finished and an `ActionResult` is emitted. No retry is attempted.
    ///
    /// # Errors
    ///
    /// - `NoActionInFlight` if nothing is moving
    /// - `StaleCompletion` if `request` is not the one in flight
    ///
    /// The state is unchanged on error.
    pub fn on_actuator_complete(
        &mut self,
        request: RequestId,
        success: bool,
    ) -> Result<Vec<ActuatorAction>, ActuatorError> {
        let Some(current) = self.in_flight else {
            return Err(ActuatorError::NoActionInFlight { state: self.state });
        };
        if current.id != request {
            return Err(ActuatorError::StaleCompletion { expected: current.id, actual: request });
        }

        let (state, outcome) = match (self.state, success) {
            (LockState::Locking, true) => (LockState::Locked, ActionOutcome::Completed),
            (LockState::Unlocking, true) => (LockState::Unlocked, ActionOutcome::Completed),
            (LockState::Locking, false) => (LockState::Unlocked, ActionOutcome::Fault),
            (LockState::Unlocking, false) => (LockState::Locked, ActionOutcome::Fault),
            (LockState::Locked | LockState::Unlocked, _) => {
                return Err(ActuatorError::NoActionInFlight { state: self.state });
            },
        };

        self.state = state;
        self.in_flight = None;

        match outcome {
            ActionOutcome::Completed => {
                tracing::info!(request = %request, state = %state, "actuator completed");
            },
            ActionOutcome::Fault => {
                tracing::warn!(request = %request, state = %state, "actuator fault, reverted");
            },
        }

        Ok(vec![
            ActuatorAction::StateChanged(state),
            ActuatorAction::ActionResult { request: current, outcome },
        ])
    }

    fn allocate_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }
}
