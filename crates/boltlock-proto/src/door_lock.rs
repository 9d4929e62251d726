//! Door Lock cluster enumerations.
//!
//! Codes follow the door-lock cluster definitions so that values can be
//! handed to the bus layer without translation tables.

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::UnknownValue;

/// Generates `to_u8` and `TryFrom<u8>` for a fieldless `#[repr(u8)]`
/// enumeration.
macro_rules! byte_codes {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl $name {
            /// Byte code of this variant.
            #[must_use]
            pub const fn to_u8(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownValue;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                $(
                    if value == Self::$variant as u8 {
                        return Ok(Self::$variant);
                    }
                )+
                Err(UnknownValue { kind: $kind, value })
            }
        }
    };
}

/// Occupancy and enablement of a user slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UserStatus {
    /// Slot is free.
    #[default]
    Available = 0,
    /// Slot holds a user who may operate the lock.
    OccupiedEnabled = 1,
    /// Slot holds a user whose credentials are currently refused.
    OccupiedDisabled = 3,
}

byte_codes!(UserStatus, "user status", [Available, OccupiedEnabled, OccupiedDisabled]);

impl UserStatus {
    /// Whether the slot holds a user (enabled or not).
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        !matches!(self, Self::Available)
    }
}

/// Kind of user, which determines when their credentials are honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum UserType {
    /// No schedule restrictions.
    #[default]
    UnrestrictedUser = 0,
    /// Restricted by a year-day schedule.
    YearDayScheduleUser = 1,
    /// Restricted by a week-day schedule.
    WeekDayScheduleUser = 2,
    /// May change lock configuration.
    ProgrammingUser = 3,
    /// Cannot operate the lock.
    NonAccessUser = 4,
    /// Duress user; operating the lock raises an alarm upstream.
    ForcedUser = 5,
    /// Credentials are valid for a single use.
    DisposableUser = 6,
    /// Credentials expire after first use plus a configured period.
    ExpiringUser = 7,
    /// Restricted by one or more schedules.
    ScheduleRestrictedUser = 8,
    /// May only operate the lock remotely.
    RemoteOnlyUser = 9,
}

byte_codes!(
    UserType,
    "user type",
    [
        UnrestrictedUser,
        YearDayScheduleUser,
        WeekDayScheduleUser,
        ProgrammingUser,
        NonAccessUser,
        ForcedUser,
        DisposableUser,
        ExpiringUser,
        ScheduleRestrictedUser,
        RemoteOnlyUser,
    ]
);

/// How many credentials a user must present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CredentialRule {
    /// Any one credential.
    #[default]
    Single = 0,
    /// Two credentials.
    Dual = 1,
    /// Three credentials.
    Tri = 2,
}

byte_codes!(CredentialRule, "credential rule", [Single, Dual, Tri]);

/// Kind of credential attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CredentialType {
    /// PIN that also grants programming rights.
    ProgrammingPin = 0,
    /// Numeric PIN code.
    #[default]
    Pin = 1,
    /// RFID tag identifier.
    Rfid = 2,
    /// Fingerprint template reference.
    Fingerprint = 3,
    /// Finger-vein template reference.
    FingerVein = 4,
    /// Face template reference.
    Face = 5,
}

byte_codes!(CredentialType, "credential type", [ProgrammingPin, Pin, Rfid, Fingerprint, FingerVein, Face]);

impl CredentialType {
    /// Whether credentials of this type are PIN codes.
    #[must_use]
    pub const fn is_pin(self) -> bool {
        matches!(self, Self::ProgrammingPin | Self::Pin)
    }
}

/// Reason a lock operation was refused or failed.
///
/// The first five codes are the cluster's standard values. `Busy` and
/// `ActuatorFault` occupy the manufacturer-specific range: `Busy` refuses a
/// command while the bolt is moving, `ActuatorFault` accompanies a motion
/// that started but did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OperationError {
    /// No more specific reason available.
    Unspecified = 0,
    /// PIN missing or not recognised.
    InvalidCredential = 1,
    /// Credential belongs to a disabled user.
    DisabledUserDenied = 2,
    /// Operation not permitted at this time.
    Restricted = 3,
    /// Not enough battery to move the bolt.
    InsufficientBattery = 4,
    /// Another bolt motion is in progress.
    Busy = 0x80,
    /// The bolt motion started but did not complete.
    ActuatorFault = 0x81,
}

byte_codes!(
    OperationError,
    "operation error",
    [Unspecified, InvalidCredential, DisabledUserDenied, Restricted, InsufficientBattery, Busy, ActuatorFault]
);

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn user_status_codes() {
        assert_eq!(UserStatus::OccupiedDisabled.to_u8(), 3);
        assert_eq!(UserStatus::try_from(1), Ok(UserStatus::OccupiedEnabled));
        assert_eq!(
            UserStatus::try_from(2),
            Err(UnknownValue { kind: "user status", value: 2 })
        );
    }

    #[test]
    fn extended_operation_errors() {
        assert_eq!(OperationError::try_from(0x80), Ok(OperationError::Busy));
        assert_eq!(OperationError::try_from(0x81), Ok(OperationError::ActuatorFault));
        assert!(OperationError::try_from(5).is_err());
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&OperationError::Busy).unwrap();
        assert_eq!(json, "128");

        let status: UserStatus = serde_json::from_str("3").unwrap();
        assert_eq!(status, UserStatus::OccupiedDisabled);
    }

    #[test]
    fn pin_credential_types() {
        assert!(CredentialType::Pin.is_pin());
        assert!(CredentialType::ProgrammingPin.is_pin());
        assert!(!CredentialType::Rfid.is_pin());
    }

    proptest! {
        #[test]
        fn user_type_decoding_is_total(code in any::<u8>()) {
            match UserType::try_from(code) {
                Ok(user_type) => prop_assert_eq!(user_type.to_u8(), code),
                Err(err) => {
                    prop_assert!(code > 9);
                    prop_assert_eq!(err.value, code);
                },
            }
        }
    }
}
