//! The lock device: one event in, a list of actions out.
//!
//! [`LockDevice`] owns everything a single lock needs (configuration,
//! actuator state machine, credential store, watchdog, auto-relock timer)
//! and exposes them through one method, [`LockDevice::handle`]. Bus
//! triggers go through a [`CommandGateway`] borrowed for that one call.
//!
//! Like the state machines it wraps, the device performs no I/O. The current
//! instant is passed with every event; the returned [`DeviceAction`]s tell the
//! driver what to do, in order.
//!
//! An unlock that completes arms the auto-relock timer, and any new motion
//! cancels it. A relock that faults re-arms the timer, so the device keeps
//! retrying every delay until the bolt is thrown or another motion starts.

use std::time::Instant;

use boltlock_proto::{
    AttributeId, ClusterId, CredentialRule, CredentialType, EndpointId, FabricIndex, OperationError,
    UserStatus, UserType,
};
use serde::Serialize;

use crate::{
    actuator::{
        ActionOutcome, ActionRequest, ActuatorAction, ActuatorStateMachine, LockAction, LockState,
        RequestId, TriggerSource,
    },
    config::DeviceConfig,
    credentials::{CredentialStore, NewCredential, NewUser},
    error::{ConfigError, CredentialError},
    gateway::{AttributeDisposition, CommandGateway, CommandResponse, UserLookup},
    timers::{AutoRelock, Watchdog},
};

/// Owned user fields carried by a [`DeviceEvent::SetUser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    /// Fabric creating the user
    pub creator: FabricIndex,
    /// Fabric issuing this change
    pub modifier: FabricIndex,
    /// Display name
    pub name: String,
    /// Identifier assigned by the administrator
    pub unique_id: u32,
    /// Occupancy of the slot
    pub status: UserStatus,
    /// Kind of user
    pub user_type: UserType,
    /// How many credentials must be presented together
    pub credential_rule: CredentialRule,
    /// Credentials to attach
    pub credentials: Vec<(CredentialType, Vec<u8>)>,
}

/// Inputs to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// An attribute was written on the bus.
    AttributeChanged {
        /// Cluster of the attribute
        cluster: ClusterId,
        /// Addressed endpoint
        endpoint: EndpointId,
        /// Attribute identifier
        attribute: AttributeId,
        /// Raw attribute value
        value: Vec<u8>,
    },

    /// Lock command.
    LockCommand {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// PIN supplied with the command
        pin: Option<Vec<u8>>,
    },

    /// Unlock command.
    UnlockCommand {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// PIN supplied with the command
        pin: Option<Vec<u8>>,
    },

    /// Read a user slot.
    GetUser {
        /// Slot index (1-based)
        slot: u16,
    },

    /// Replace a user slot.
    SetUser {
        /// Slot index (1-based)
        slot: u16,
        /// New contents
        user: UserUpdate,
    },

    /// Free a user slot.
    ClearUser {
        /// Slot index (1-based)
        slot: u16,
    },

    /// The motor finished moving for `request`.
    ActuatorComplete {
        /// Request the motor was driving
        request: RequestId,
        /// Whether the bolt reached its target
        success: bool,
    },

    /// Report the current lock state.
    QueryState,

    /// Periodic tick for the timers.
    Tick,
}

/// Notifications for the bus layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "notification", rename_all = "snake_case")]
pub enum Notification {
    /// The lock state changed.
    LockStateChanged {
        /// New state
        state: LockState,
    },
    /// A started action finished.
    ActionResult {
        /// The finished request
        request: ActionRequest,
        /// How it finished
        outcome: ActionOutcome,
        /// `ActuatorFault` when the motion did not complete
        error: Option<OperationError>,
    },
}

/// Replies to bus requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Disposition of an attribute change.
    Attribute {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// What the gateway did with it
        disposition: AttributeDisposition,
    },
    /// Reply to a lock or unlock command.
    Command {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// Requested motion
        action: LockAction,
        /// Result for the remote party
        response: CommandResponse,
    },
    /// Reply to a user read.
    User {
        /// Slot index
        slot: u16,
        /// Lookup result
        result: Result<UserLookup, CredentialError>,
    },
    /// Reply to a user write.
    UserSet {
        /// Slot index
        slot: u16,
        /// Write result
        result: Result<(), CredentialError>,
    },
    /// Reply to a user clear.
    UserCleared {
        /// Slot index
        slot: u16,
        /// Clear result
        result: Result<(), CredentialError>,
    },
    /// Current lock state.
    State {
        /// Lock state
        state: LockState,
        /// Request moving the bolt, if any
        in_flight: Option<ActionRequest>,
    },
}

/// Actions returned by the device, to be executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAction {
    /// Start moving the bolt; report back with
    /// [`DeviceEvent::ActuatorComplete`].
    DriveBolt(ActionRequest),
    /// Publish a notification to the bus.
    Notify(Notification),
    /// Reply to the request that produced this action.
    Respond(Response),
}

/// A single lock.
#[derive(Debug, Clone)]
pub struct LockDevice {
    config: DeviceConfig,
    actuator: ActuatorStateMachine,
    credentials: CredentialStore,
    watchdog: Option<Watchdog>,
    auto_relock: Option<AutoRelock>,
}

impl LockDevice {
    /// Build a device from a validated configuration.
    pub fn new(config: DeviceConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            actuator: ActuatorStateMachine::new(config.boot_state),
            credentials: CredentialStore::new(config.user_slots),
            watchdog: config.actuator_timeout().map(Watchdog::new),
            auto_relock: config.auto_relock().map(AutoRelock::new),
            config,
        })
    }

    /// Current lock state.
    #[must_use]
    pub fn state(&self) -> LockState {
        self.actuator.state()
    }

    /// Configuration the device was built with.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The actuator state machine.
    #[must_use]
    pub fn actuator(&self) -> &ActuatorStateMachine {
        &self.actuator
    }

    /// The credential store.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Whether an auto-relock is pending.
    #[must_use]
    pub fn relock_pending(&self) -> bool {
        self.auto_relock.as_ref().is_some_and(AutoRelock::is_armed)
    }

    /// Gateway over this device's parts.
    pub fn gateway(&mut self) -> CommandGateway<'_> {
        CommandGateway::new(&self.config, &mut self.actuator, &mut self.credentials)
    }

    /// Process one event.
    pub fn handle(&mut self, event: DeviceEvent, now: Instant) -> Vec<DeviceAction> {
        let mut out = Vec::new();

        match event {
            DeviceEvent::AttributeChanged { cluster, endpoint, attribute, value } => {
                let reply = self.gateway().on_post_attribute_change(cluster, endpoint, attribute, &value);
                self.absorb(reply.actions, now, &mut out);
                out.push(DeviceAction::Respond(Response::Attribute {
                    endpoint,
                    disposition: reply.reply,
                }));
            },
            DeviceEvent::LockCommand { endpoint, pin } => {
                let reply = self.gateway().on_lock_command(endpoint, pin.as_deref());
                self.absorb(reply.actions, now, &mut out);
                out.push(DeviceAction::Respond(Response::Command {
                    endpoint,
                    action: LockAction::Lock,
                    response: reply.reply,
                }));
            },
            DeviceEvent::UnlockCommand { endpoint, pin } => {
                let reply = self.gateway().on_unlock_command(endpoint, pin.as_deref());
                self.absorb(reply.actions, now, &mut out);
                out.push(DeviceAction::Respond(Response::Command {
                    endpoint,
                    action: LockAction::Unlock,
                    response: reply.reply,
                }));
            },
            DeviceEvent::GetUser { slot } => {
                let result = self.gateway().on_get_user(slot);
                out.push(DeviceAction::Respond(Response::User { slot, result }));
            },
            DeviceEvent::SetUser { slot, user } => {
                let credentials: Vec<NewCredential<'_>> = user
                    .credentials
                    .iter()
                    .map(|(credential_type, data)| NewCredential {
                        credential_type: *credential_type,
                        data: data.as_slice(),
                    })
                    .collect();
                let new_user = NewUser {
                    creator: user.creator,
                    modifier: user.modifier,
                    name: &user.name,
                    unique_id: user.unique_id,
                    status: user.status,
                    user_type: user.user_type,
                    credential_rule: user.credential_rule,
                    credentials: &credentials,
                };

                let result = self.gateway().on_set_user(slot, new_user);
                if let Err(err) = &result {
                    tracing::warn!(slot, %err, "set user rejected");
                }
                out.push(DeviceAction::Respond(Response::UserSet { slot, result }));
            },
            DeviceEvent::ClearUser { slot } => {
                let result = self.gateway().on_clear_user(slot);
                out.push(DeviceAction::Respond(Response::UserCleared { slot, result }));
            },
            DeviceEvent::ActuatorComplete { request, success } => {
                match self.actuator.on_actuator_complete(request, success) {
                    Ok(actions) => self.absorb(actions, now, &mut out),
                    Err(err) => tracing::warn!(%err, "ignoring actuator completion"),
                }
            },
            DeviceEvent::QueryState => {
                out.push(DeviceAction::Respond(Response::State {
                    state: self.actuator.state(),
                    in_flight: self.actuator.in_flight().copied(),
                }));
            },
            DeviceEvent::Tick => self.tick(now, &mut out),
        }

        out
    }

    fn tick(&mut self, now: Instant, out: &mut Vec<DeviceAction>) {
        let expired = self.watchdog.as_mut().and_then(|watchdog| watchdog.poll(now));
        if let Some(request) = expired {
            tracing::warn!(request = %request, "actuator watchdog expired, failing motion");
            match self.actuator.on_actuator_complete(request, false) {
                Ok(actions) => self.absorb(actions, now, out),
                Err(err) => tracing::debug!(%err, "watchdog fired for finished request"),
            }
        }

        let due = self.auto_relock.as_mut().and_then(|relock| relock.poll(now));
        if let Some(endpoint) = due {
            if self.actuator.state() == LockState::Unlocked {
                tracing::info!(endpoint, "auto-relock");
                let (_, actions) = self.actuator.initiate(LockAction::Lock, TriggerSource::AutoRelock, endpoint);
                self.absorb(actions, now, out);
            } else {
                tracing::debug!(endpoint, state = %self.actuator.state(), "auto-relock skipped");
            }
        }
    }

    /// Translate actuator actions, updating the timers on the way.
    fn absorb(&mut self, actions: Vec<ActuatorAction>, now: Instant, out: &mut Vec<DeviceAction>) {
        for action in actions {
            match action {
                ActuatorAction::DriveBolt(request) => {
                    if let Some(watchdog) = &mut self.watchdog {
                        watchdog.arm(request.id, now);
                    }
                    if let Some(relock) = &mut self.auto_relock {
                        relock.cancel();
                    }
                    out.push(DeviceAction::DriveBolt(request));
                },
                ActuatorAction::StateChanged(state) => {
                    out.push(DeviceAction::Notify(Notification::LockStateChanged { state }));
                },
                ActuatorAction::ActionResult { request, outcome } => {
                    if let Some(watchdog) = &mut self.watchdog {
                        watchdog.disarm(request.id);
                    }
                    let relock_due = match outcome {
                        ActionOutcome::Completed => request.action == LockAction::Unlock,
                        ActionOutcome::Fault => request.source == TriggerSource::AutoRelock,
                    };
                    if relock_due {
                        if let Some(relock) = &mut self.auto_relock {
                            relock.arm(request.endpoint, now);
                        }
                    }
                    let error = match outcome {
                        ActionOutcome::Completed => None,
                        ActionOutcome::Fault => Some(OperationError::ActuatorFault),
                    };
                    out.push(DeviceAction::Notify(Notification::ActionResult { request, outcome, error }));
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use boltlock_proto::ids::{attributes, clusters};

    use super::*;
    use crate::config::BootState;

    fn device(config: DeviceConfig) -> LockDevice {
        LockDevice::new(config).unwrap()
    }

    fn drive_requests(actions: &[DeviceAction]) -> Vec<ActionRequest> {
        actions
            .iter()
            .filter_map(|a| match a {
                DeviceAction::DriveBolt(request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    fn state_changes(actions: &[DeviceAction]) -> Vec<LockState> {
        actions
            .iter()
            .filter_map(|a| match a {
                DeviceAction::Notify(Notification::LockStateChanged { state }) => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn attribute_lock_scenario() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { boot_state: BootState::Unlocked, ..Default::default() });

        let actions = lock.handle(
            DeviceEvent::AttributeChanged {
                cluster: clusters::ON_OFF,
                endpoint: 1,
                attribute: attributes::ON_OFF,
                value: vec![0x01],
            },
            t0,
        );
        let drives = drive_requests(&actions);
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].source, TriggerSource::AttributeWrite);
        assert_eq!(lock.state(), LockState::Locking);

        let actions = lock.handle(DeviceEvent::ActuatorComplete { request: drives[0].id, success: true }, t0);
        assert_eq!(lock.state(), LockState::Locked);
        assert_eq!(state_changes(&actions), vec![LockState::Locked]);
    }

    #[test]
    fn watchdog_fails_lost_motion() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { actuator_timeout_ms: Some(2_000), ..Default::default() });

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);
        let request = drive_requests(&actions)[0];

        assert!(lock.handle(DeviceEvent::Tick, t0 + Duration::from_millis(1_999)).is_empty());

        let actions = lock.handle(DeviceEvent::Tick, t0 + Duration::from_millis(2_000));
        assert_eq!(lock.state(), LockState::Locked);
        assert!(actions.contains(&DeviceAction::Notify(Notification::ActionResult {
            request,
            outcome: ActionOutcome::Fault,
            error: Some(OperationError::ActuatorFault),
        })));

        // A late completion from the motor is stale and ignored.
        let actions = lock.handle(DeviceEvent::ActuatorComplete { request: request.id, success: true }, t0);
        assert!(actions.is_empty());
        assert_eq!(lock.state(), LockState::Locked);
    }

    #[test]
    fn without_watchdog_lost_motion_never_settles() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { actuator_timeout_ms: None, ..Default::default() });

        lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);
        let actions = lock.handle(DeviceEvent::Tick, t0 + Duration::from_secs(24 * 3600));

        assert!(actions.is_empty());
        assert_eq!(lock.state(), LockState::Unlocking);
    }

    #[test]
    fn auto_relock_after_unlock() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { auto_relock_ms: Some(5_000), ..Default::default() });

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 2, pin: None }, t0);
        let unlock = drive_requests(&actions)[0];
        lock.handle(DeviceEvent::ActuatorComplete { request: unlock.id, success: true }, t0);
        assert!(lock.relock_pending());

        assert!(lock.handle(DeviceEvent::Tick, t0 + Duration::from_secs(4)).is_empty());

        let actions = lock.handle(DeviceEvent::Tick, t0 + Duration::from_secs(5));
        let relock = drive_requests(&actions);
        assert_eq!(relock.len(), 1);
        assert_eq!(relock[0].action, LockAction::Lock);
        assert_eq!(relock[0].source, TriggerSource::AutoRelock);
        assert_eq!(relock[0].endpoint, 2);
        assert_eq!(lock.state(), LockState::Locking);
    }

    #[test]
    fn manual_lock_cancels_auto_relock() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { auto_relock_ms: Some(5_000), ..Default::default() });

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);
        let unlock = drive_requests(&actions)[0];
        lock.handle(DeviceEvent::ActuatorComplete { request: unlock.id, success: true }, t0);

        let actions = lock.handle(DeviceEvent::LockCommand { endpoint: 1, pin: None }, t0);
        assert_eq!(drive_requests(&actions).len(), 1);
        assert!(!lock.relock_pending());
    }

    #[test]
    fn failed_unlock_does_not_arm_relock() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { auto_relock_ms: Some(5_000), ..Default::default() });

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);
        let unlock = drive_requests(&actions)[0];
        lock.handle(DeviceEvent::ActuatorComplete { request: unlock.id, success: false }, t0);

        assert_eq!(lock.state(), LockState::Locked);
        assert!(!lock.relock_pending());
    }

    #[test]
    fn failed_auto_relock_is_retried() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig { auto_relock_ms: Some(5_000), ..Default::default() });

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);
        let unlock = drive_requests(&actions)[0];
        let actions = lock.handle(DeviceEvent::ActuatorComplete { request: unlock.id, success: true }, t0);
        assert!(actions.contains(&DeviceAction::Notify(Notification::ActionResult {
            request: unlock,
            outcome: ActionOutcome::Completed,
            error: None,
        })));

        let t1 = t0 + Duration::from_secs(5);
        let relock = drive_requests(&lock.handle(DeviceEvent::Tick, t1))[0];
        let actions = lock.handle(DeviceEvent::ActuatorComplete { request: relock.id, success: false }, t1);
        assert!(actions.contains(&DeviceAction::Notify(Notification::ActionResult {
            request: relock,
            outcome: ActionOutcome::Fault,
            error: Some(OperationError::ActuatorFault),
        })));
        assert_eq!(lock.state(), LockState::Unlocked);
        assert!(lock.relock_pending());

        assert!(lock.handle(DeviceEvent::Tick, t1 + Duration::from_secs(4)).is_empty());

        let retry = drive_requests(&lock.handle(DeviceEvent::Tick, t1 + Duration::from_secs(5)));
        assert_eq!(retry.len(), 1);
        assert_eq!(retry[0].source, TriggerSource::AutoRelock);
        assert_eq!(lock.state(), LockState::Locking);
    }

    #[test]
    fn set_user_event_round_trip() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig::default());

        let user = UserUpdate {
            creator: 1,
            modifier: 1,
            name: "Alice".into(),
            unique_id: 42,
            status: UserStatus::OccupiedEnabled,
            user_type: UserType::UnrestrictedUser,
            credential_rule: CredentialRule::Single,
            credentials: vec![(CredentialType::Pin, b"2468".to_vec())],
        };
        let actions = lock.handle(DeviceEvent::SetUser { slot: 4, user }, t0);
        assert_eq!(actions, vec![DeviceAction::Respond(Response::UserSet { slot: 4, result: Ok(()) })]);

        let actions = lock.handle(DeviceEvent::GetUser { slot: 4 }, t0);
        let [DeviceAction::Respond(Response::User { result: Ok(UserLookup::Found(record)), .. })] =
            actions.as_slice()
        else {
            panic!("expected a found user, got {actions:?}");
        };
        assert_eq!(record.user_name.as_str(), "Alice");
        assert_eq!(record.credentials.len(), 1);

        let actions = lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: Some(b"2468".to_vec()) }, t0);
        assert_eq!(drive_requests(&actions).len(), 1);
    }

    #[test]
    fn query_state_reports_in_flight() {
        let t0 = Instant::now();
        let mut lock = device(DeviceConfig::default());
        lock.handle(DeviceEvent::UnlockCommand { endpoint: 1, pin: None }, t0);

        let actions = lock.handle(DeviceEvent::QueryState, t0);
        let [DeviceAction::Respond(Response::State { state, in_flight: Some(request) })] =
            actions.as_slice()
        else {
            panic!("expected state response, got {actions:?}");
        };
        assert_eq!(*state, LockState::Unlocking);
        assert_eq!(request.id, RequestId(1));
    }

    #[test]
    fn invalid_config_rejected() {
        let result = LockDevice::new(DeviceConfig { lock_endpoints: vec![], ..Default::default() });
        assert!(matches!(result, Err(ConfigError::NoEndpoints)));
    }
}
