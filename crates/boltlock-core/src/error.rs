//! Error types for the controller core.
//!
//! None of these are fatal. Store and actuator errors are returned to the
//! caller for reporting upstream; routing errors are absorbed by the gateway.

use boltlock_proto::{AttributeId, ClusterId, EndpointId};
use thiserror::Error;

use crate::actuator::{LockState, RequestId};

/// Errors from the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Slot index outside `1..=max`.
    #[error("slot {slot} outside configured range 1..={max}")]
    InvalidSlot {
        /// Requested slot
        slot: u16,
        /// Highest valid slot
        max: u16,
    },

    /// A field failed validation; the slot was not modified.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
}

/// Why a `set_user` argument was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    /// User name longer than the slot's name buffer.
    #[error("name is {len} bytes, capacity is {capacity}")]
    NameTooLong {
        /// Length of the supplied name in bytes
        len: usize,
        /// Capacity of the name buffer
        capacity: usize,
    },

    /// More credentials than a user can hold.
    #[error("{count} credentials supplied, at most {max} allowed")]
    TooManyCredentials {
        /// Number supplied
        count: usize,
        /// Per-user maximum
        max: usize,
    },

    /// A credential with no data.
    #[error("credential {index} is empty")]
    EmptyCredential {
        /// Position in the supplied list
        index: usize,
    },

    /// Credential data longer than the credential buffer.
    #[error("credential {index} is {len} bytes, capacity is {capacity}")]
    CredentialTooLong {
        /// Position in the supplied list
        index: usize,
        /// Length of the supplied data
        len: usize,
        /// Capacity of the credential buffer
        capacity: usize,
    },

    /// PIN credential containing something other than ASCII digits.
    #[error("credential {index} is a PIN but is not all digits")]
    MalformedPin {
        /// Position in the supplied list
        index: usize,
    },
}

/// Misuse of the actuator completion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Completion reported while no motion was in progress.
    #[error("completion reported in state {state:?} with no action in flight")]
    NoActionInFlight {
        /// State at the time of the report
        state: LockState,
    },

    /// Completion reported for a request other than the one in flight.
    #[error("completion for request {actual} but request {expected} is in flight")]
    StaleCompletion {
        /// Request currently in flight
        expected: RequestId,
        /// Request named by the completion
        actual: RequestId,
    },
}

/// Triggers the gateway drops instead of forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Attribute change on a cluster the lock does not act on.
    #[error("unhandled cluster {0:#06x}")]
    UnhandledCluster(ClusterId),

    /// Attribute other than On/Off.
    #[error("unhandled attribute {0:#06x}")]
    UnhandledAttribute(AttributeId),

    /// Endpoint that does not carry a lock.
    #[error("unexpected endpoint {0:#04x}")]
    UnhandledEndpoint(EndpointId),

    /// Attribute change with no value bytes.
    #[error("attribute change carried no value")]
    EmptyValue,
}

/// Invalid device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No lock-bearing endpoints configured.
    #[error("at least one lock endpoint is required")]
    NoEndpoints,

    /// Zero user slots configured.
    #[error("at least one user slot is required")]
    NoUserSlots,

    /// A zero-length duration where a positive one is required.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}
