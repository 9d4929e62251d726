//! Operations applied to both the model and the real device.

use arbitrary::Arbitrary;

/// A four-digit PIN derived from a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Arbitrary)]
pub struct SmallPin {
    /// Source of the digits
    pub seed: u16,
}

impl SmallPin {
    /// ASCII digits, always four long.
    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        format!("{:04}", self.seed % 10_000).into_bytes()
    }
}

/// One step of a generated test.
///
/// Ids are small integers; out-of-range ones exercise the rejection paths.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Lock command.
    Lock {
        /// Addressed endpoint
        endpoint: u8,
        /// Optional PIN
        pin: Option<SmallPin>,
    },
    /// Unlock command.
    Unlock {
        /// Addressed endpoint
        endpoint: u8,
        /// Optional PIN
        pin: Option<SmallPin>,
    },
    /// Write the On/Off attribute.
    WriteOnOff {
        /// Addressed endpoint
        endpoint: u8,
        /// Attribute value
        value: u8,
    },
    /// The motor reports on whatever is in flight.
    CompleteMotion {
        /// Whether the bolt arrived
        success: bool,
    },
    /// Store an enabled or disabled user with one PIN.
    SetUser {
        /// Slot index (1-based)
        slot: u8,
        /// User status
        enabled: bool,
        /// The user's PIN
        pin: SmallPin,
    },
    /// Free a slot.
    ClearUser {
        /// Slot index (1-based)
        slot: u8,
    },
    /// Read a slot.
    GetUser {
        /// Slot index (1-based)
        slot: u8,
    },
    /// Move time forward and tick the timers.
    AdvanceTime {
        /// Milliseconds to advance
        millis: u16,
    },
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Accepted.
    Ok,
    /// Rejected.
    Error(OperationError),
}

impl OperationResult {
    /// Whether the operation was accepted.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Whether the operation was rejected.
    #[must_use]
    pub fn is_err(self) -> bool {
        !self.is_ok()
    }
}

/// Why an operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Slot outside the store
    InvalidSlot,
    /// User record failed validation
    InvalidArgument,
    /// Attribute write for an endpoint without a lock
    UnhandledEndpoint,
    /// Attribute write dropped for another routing reason
    Ignored,
    /// PIN missing or unknown
    InvalidCredential,
    /// PIN belongs to a disabled user
    DisabledUser,
    /// A motion is already in progress
    Busy,
    /// Completion with nothing in flight
    NothingInFlight,
}

impl OperationError {
    /// Bus error code reported for a refused door command, if any.
    #[must_use]
    pub fn bus_error(self) -> Option<boltlock_proto::OperationError> {
        match self {
            Self::InvalidCredential => Some(boltlock_proto::OperationError::InvalidCredential),
            Self::DisabledUser => Some(boltlock_proto::OperationError::DisabledUserDenied),
            Self::Busy => Some(boltlock_proto::OperationError::Busy),
            Self::InvalidSlot
            | Self::InvalidArgument
            | Self::UnhandledEndpoint
            | Self::Ignored
            | Self::NothingInFlight => None,
        }
    }

    /// Inverse of [`bus_error`](Self::bus_error).
    #[must_use]
    pub fn from_bus_error(error: boltlock_proto::OperationError) -> Option<Self> {
        [Self::InvalidCredential, Self::DisabledUser, Self::Busy]
            .into_iter()
            .find(|candidate| candidate.bus_error() == Some(error))
    }
}
