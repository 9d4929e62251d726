//! Command gateway: the bus-facing entry points.
//!
//! Validates addressing and parameters of incoming triggers and routes them
//! to the actuator state machine or the credential store. The gateway holds
//! no state of its own; it borrows the device's configuration, actuator and
//! store for the duration of one handler call.
//!
//! Routing problems (unknown cluster, attribute or endpoint) are logged and
//! absorbed here. Actuator results are always returned to the caller as
//! values so the bus layer can report them to the remote party.

use boltlock_proto::{
    AttributeId, ClusterId, EndpointId, OperationError,
    ids::{attributes, clusters},
};
use serde::Serialize;

use crate::{
    actuator::{ActuatorAction, ActuatorStateMachine, InitiateOutcome, LockAction, TriggerSource},
    config::DeviceConfig,
    credentials::{CredentialStore, NewUser, PinCheck, UserRecord},
    error::{CredentialError, RoutingError},
};

/// Reply to a trigger plus the actuator actions it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply<T> {
    /// Value for the bus layer
    pub reply: T,
    /// Actions for the driver, in order
    pub actions: Vec<ActuatorAction>,
}

impl<T> GatewayReply<T> {
    fn without_actions(reply: T) -> Self {
        Self { reply, actions: Vec::new() }
    }
}

/// What happened to an attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeDisposition {
    /// Mapped to a lock action and handed to the actuator.
    Forwarded(InitiateOutcome),
    /// Dropped; the reason has been logged.
    Ignored(RoutingError),
}

/// Result of a lock or unlock command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    /// Whether the command was accepted (started or already satisfied)
    pub accepted: bool,
    /// Actuator result, if the actuator was consulted
    pub outcome: Option<InitiateOutcome>,
    /// Reason for refusal, if refused
    pub error: Option<OperationError>,
}

impl CommandResponse {
    fn from_outcome(outcome: InitiateOutcome) -> Self {
        match outcome {
            InitiateOutcome::Started(_) | InitiateOutcome::AlreadyInState => {
                Self { accepted: true, outcome: Some(outcome), error: None }
            },
            InitiateOutcome::Busy => {
                Self { accepted: false, outcome: Some(outcome), error: Some(OperationError::Busy) }
            },
        }
    }

    fn refused(error: OperationError) -> Self {
        Self { accepted: false, outcome: None, error: Some(error) }
    }
}

/// Result of a user lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserLookup {
    /// The slot holds a user.
    Found(UserRecord),
    /// The slot is available.
    NotFound,
}

/// Bus-facing entry points over borrowed device parts.
#[derive(Debug)]
pub struct CommandGateway<'a> {
    config: &'a DeviceConfig,
    actuator: &'a mut ActuatorStateMachine,
    credentials: &'a mut CredentialStore,
}

impl<'a> CommandGateway<'a> {
    /// Borrow the parts of a device for one handler call.
    pub fn new(
        config: &'a DeviceConfig,
        actuator: &'a mut ActuatorStateMachine,
        credentials: &'a mut CredentialStore,
    ) -> Self {
        Self { config, actuator, credentials }
    }

    /// Attribute change with cluster dispatch.
    ///
    /// Only the On/Off cluster is acted on; everything else is ignored.
    pub fn on_post_attribute_change(
        &mut self,
        cluster: ClusterId,
        endpoint: EndpointId,
        attribute: AttributeId,
        value: &[u8],
    ) -> GatewayReply<AttributeDisposition> {
        tracing::debug!(cluster, endpoint, attribute, "attribute changed");

        if cluster != clusters::ON_OFF {
            let reason = RoutingError::UnhandledCluster(cluster);
            tracing::info!(%reason, "ignoring attribute change");
            return GatewayReply::without_actions(AttributeDisposition::Ignored(reason));
        }

        self.on_attribute_changed(endpoint, attribute, value)
    }

    /// On/Off attribute change: nonzero locks, zero unlocks.
    pub fn on_attribute_changed(
        &mut self,
        endpoint: EndpointId,
        attribute: AttributeId,
        value: &[u8],
    ) -> GatewayReply<AttributeDisposition> {
        let action = match self.route_attribute(endpoint, attribute, value) {
            Ok(action) => action,
            Err(reason) => {
                if let RoutingError::UnhandledEndpoint(_) = reason {
                    tracing::warn!(%reason, "ignoring attribute change");
                } else {
                    tracing::info!(%reason, "ignoring attribute change");
                }
                return GatewayReply::without_actions(AttributeDisposition::Ignored(reason));
            },
        };

        let (outcome, actions) = self.actuator.initiate(action, TriggerSource::AttributeWrite, endpoint);
        GatewayReply { reply: AttributeDisposition::Forwarded(outcome), actions }
    }

    /// Explicit lock command.
    pub fn on_lock_command(
        &mut self,
        endpoint: EndpointId,
        pin: Option<&[u8]>,
    ) -> GatewayReply<CommandResponse> {
        self.door_command(LockAction::Lock, endpoint, pin)
    }

    /// Explicit unlock command.
    pub fn on_unlock_command(
        &mut self,
        endpoint: EndpointId,
        pin: Option<&[u8]>,
    ) -> GatewayReply<CommandResponse> {
        self.door_command(LockAction::Unlock, endpoint, pin)
    }

    /// Look up the user in `slot`.
    pub fn on_get_user(&self, slot: u16) -> Result<UserLookup, CredentialError> {
        let record = self.credentials.get_user(slot)?;
        tracing::debug!(slot, unique_id = record.user_unique_id, "get user");

        if record.is_occupied() { Ok(UserLookup::Found(record)) } else { Ok(UserLookup::NotFound) }
    }

    /// Replace the user in `slot`.
    pub fn on_set_user(&mut self, slot: u16, user: NewUser<'_>) -> Result<(), CredentialError> {
        self.credentials.set_user(slot, user)
    }

    /// Free `slot`.
    pub fn on_clear_user(&mut self, slot: u16) -> Result<(), CredentialError> {
        self.credentials.clear_user(slot)
    }

    fn route_attribute(
        &self,
        endpoint: EndpointId,
        attribute: AttributeId,
        value: &[u8],
    ) -> Result<LockAction, RoutingError> {
        if attribute != attributes::ON_OFF {
            return Err(RoutingError::UnhandledAttribute(attribute));
        }
        if !self.config.is_lock_endpoint(endpoint) {
            return Err(RoutingError::UnhandledEndpoint(endpoint));
        }

        match value.first() {
            None => Err(RoutingError::EmptyValue),
            Some(0) => Ok(LockAction::Unlock),
            Some(_) => Ok(LockAction::Lock),
        }
    }

    fn door_command(
        &mut self,
        action: LockAction,
        endpoint: EndpointId,
        pin: Option<&[u8]>,
    ) -> GatewayReply<CommandResponse> {
        let current = self.actuator.state();
        if current == action.target_state() {
            tracing::info!(endpoint, ?action, state = %current, "door already in requested state");
        } else {
            tracing::info!(endpoint, ?action, state = %current, "door command");
        }

        if let Err(error) = self.check_pin(pin) {
            tracing::warn!(endpoint, ?action, ?error, "door command refused");
            return GatewayReply::without_actions(CommandResponse::refused(error));
        }

        let (outcome, actions) = self.actuator.initiate(action, TriggerSource::ExplicitCommand, endpoint);
        GatewayReply { reply: CommandResponse::from_outcome(outcome), actions }
    }

    fn check_pin(&self, pin: Option<&[u8]>) -> Result<(), OperationError> {
        let Some(pin) = pin else {
            return if self.config.require_pin_for_remote {
                Err(OperationError::InvalidCredential)
            } else {
                Ok(())
            };
        };

        match self.credentials.verify_pin(pin) {
            PinCheck::Matched { slot } => {
                tracing::debug!(slot, "pin accepted");
                Ok(())
            },
            PinCheck::UserDisabled { slot } => {
                tracing::debug!(slot, "pin belongs to disabled user");
                Err(OperationError::DisabledUserDenied)
            },
            PinCheck::NoMatch => Err(OperationError::InvalidCredential),
        }
    }
}
