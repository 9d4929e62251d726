//! Console command parsing.
//!
//! One command per line. Numeric ids accept decimal or `0x` hex.
//!
//! ```text
//! lock <endpoint> [pin]
//! unlock <endpoint> [pin]
//! attr <endpoint> <attribute> <value>
//! cluster <cluster> <endpoint> <attribute> <value>
//! get-user <slot>
//! set-user <slot> <name> <unique-id> [status] [type] [pin]
//! clear-user <slot>
//! jam
//! status
//! quit
//! ```

use boltlock_core::{DeviceEvent, UserUpdate};
use boltlock_proto::{
    AttributeId, ClusterId, CredentialRule, CredentialType, EndpointId, UserStatus, UserType,
    ids::clusters,
};
use thiserror::Error;

/// Fabric index used for users created from the console.
const CONSOLE_FABRIC: u8 = 1;

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Required arguments are missing.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// A numeric argument did not parse or is out of range.
    #[error("invalid {what}: {value:?}")]
    InvalidNumber {
        /// Argument name
        what: &'static str,
        /// Text as typed
        value: String,
    },

    /// Unknown user status.
    #[error("invalid user status {0:?} (expected enabled, disabled or a number)")]
    InvalidStatus(String),
}

/// Parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Lock command.
    Lock {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// PIN, if given
        pin: Option<String>,
    },

    /// Unlock command.
    Unlock {
        /// Addressed endpoint
        endpoint: EndpointId,
        /// PIN, if given
        pin: Option<String>,
    },

    /// Attribute write, on the On/Off cluster unless given.
    Attribute {
        /// Cluster of the attribute
        cluster: ClusterId,
        /// Addressed endpoint
        endpoint: EndpointId,
        /// Attribute identifier
        attribute: AttributeId,
        /// Single-byte value
        value: u8,
    },

    /// Read a user slot.
    GetUser {
        /// Slot index
        slot: u16,
    },

    /// Replace a user slot.
    SetUser {
        /// Slot index
        slot: u16,
        /// New contents
        user: UserUpdate,
    },

    /// Free a user slot.
    ClearUser {
        /// Slot index
        slot: u16,
    },

    /// Make the next motor motion fail.
    Jam,

    /// Report the lock state.
    Status,

    /// Stop the runtime.
    Quit,

    /// Blank line.
    Empty,

    /// Unknown command.
    Unknown {
        /// The original input
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name
        command: String,
        /// What was wrong
        error: ParseError,
    },
}

impl Command {
    /// The device event this command stands for, if any.
    ///
    /// `Jam`, `Quit` and the error variants are handled by the console
    /// itself.
    pub fn into_event(self) -> Option<DeviceEvent> {
        match self {
            Self::Lock { endpoint, pin } => {
                Some(DeviceEvent::LockCommand { endpoint, pin: pin.map(String::into_bytes) })
            },
            Self::Unlock { endpoint, pin } => {
                Some(DeviceEvent::UnlockCommand { endpoint, pin: pin.map(String::into_bytes) })
            },
            Self::Attribute { cluster, endpoint, attribute, value } => {
                Some(DeviceEvent::AttributeChanged { cluster, endpoint, attribute, value: vec![value] })
            },
            Self::GetUser { slot } => Some(DeviceEvent::GetUser { slot }),
            Self::SetUser { slot, user } => Some(DeviceEvent::SetUser { slot, user }),
            Self::ClearUser { slot } => Some(DeviceEvent::ClearUser { slot }),
            Self::Status => Some(DeviceEvent::QueryState),
            Self::Jam | Self::Quit | Self::Empty | Self::Unknown { .. } | Self::InvalidArgs { .. } => {
                None
            },
        }
    }
}

/// Parse one input line.
pub fn parse(input: &str) -> Command {
    let input = input.trim();
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Command::Empty;
    };

    let parsed = match command {
        "lock" => parse_door(args, "lock <endpoint> [pin]")
            .map(|(endpoint, pin)| Command::Lock { endpoint, pin }),
        "unlock" => parse_door(args, "unlock <endpoint> [pin]")
            .map(|(endpoint, pin)| Command::Unlock { endpoint, pin }),
        "attr" => parse_attribute(clusters::ON_OFF, args, "attr <endpoint> <attribute> <value>"),
        "cluster" => match args.split_first() {
            Some((cluster, rest)) => parse_number::<ClusterId>("cluster", cluster).and_then(|cluster| {
                parse_attribute(cluster, rest, "cluster <cluster> <endpoint> <attribute> <value>")
            }),
            None => Err(ParseError::Usage("cluster <cluster> <endpoint> <attribute> <value>")),
        },
        "get-user" => parse_slot(args, "get-user <slot>").map(|slot| Command::GetUser { slot }),
        "set-user" => parse_set_user(args),
        "clear-user" => parse_slot(args, "clear-user <slot>").map(|slot| Command::ClearUser { slot }),
        "jam" => Ok(Command::Jam),
        "status" => Ok(Command::Status),
        "quit" | "q" => Ok(Command::Quit),
        _ => return Command::Unknown { input: input.to_string() },
    };

    parsed.unwrap_or_else(|error| Command::InvalidArgs { command: command.to_string(), error })
}

fn parse_door(args: &[&str], usage: &'static str) -> Result<(EndpointId, Option<String>), ParseError> {
    match args {
        [endpoint] => Ok((parse_number("endpoint", endpoint)?, None)),
        [endpoint, pin] => Ok((parse_number("endpoint", endpoint)?, Some((*pin).to_string()))),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn parse_attribute(
    cluster: ClusterId,
    args: &[&str],
    usage: &'static str,
) -> Result<Command, ParseError> {
    let [endpoint, attribute, value] = args else {
        return Err(ParseError::Usage(usage));
    };

    Ok(Command::Attribute {
        cluster,
        endpoint: parse_number("endpoint", endpoint)?,
        attribute: parse_number("attribute", attribute)?,
        value: parse_number("value", value)?,
    })
}

fn parse_slot(args: &[&str], usage: &'static str) -> Result<u16, ParseError> {
    match args {
        [slot] => parse_number("slot", slot),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn parse_set_user(args: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "set-user <slot> <name> <unique-id> [status] [type] [pin]";

    let (slot, name, unique_id, rest) = match args {
        [slot, name, unique_id, rest @ ..] if rest.len() <= 3 => (slot, name, unique_id, rest),
        _ => return Err(ParseError::Usage(USAGE)),
    };

    let status = rest.first().map_or(Ok(UserStatus::OccupiedEnabled), |s| parse_status(s))?;
    let user_type = match rest.get(1) {
        Some(text) => {
            let code = parse_number::<u8>("user type", text)?;
            UserType::try_from(code).map_err(|_| ParseError::InvalidNumber {
                what: "user type",
                value: (*text).to_string(),
            })?
        },
        None => UserType::UnrestrictedUser,
    };
    let credentials = rest
        .get(2)
        .map(|pin| vec![(CredentialType::Pin, pin.as_bytes().to_vec())])
        .unwrap_or_default();

    Ok(Command::SetUser {
        slot: parse_number("slot", slot)?,
        user: UserUpdate {
            creator: CONSOLE_FABRIC,
            modifier: CONSOLE_FABRIC,
            name: (*name).to_string(),
            unique_id: parse_number("unique id", unique_id)?,
            status,
            user_type,
            credential_rule: CredentialRule::Single,
            credentials,
        },
    })
}

fn parse_status(text: &str) -> Result<UserStatus, ParseError> {
    match text {
        "enabled" => Ok(UserStatus::OccupiedEnabled),
        "disabled" => Ok(UserStatus::OccupiedDisabled),
        "available" => Ok(UserStatus::Available),
        other => parse_number::<u8>("user status", other)
            .ok()
            .and_then(|code| UserStatus::try_from(code).ok())
            .ok_or_else(|| ParseError::InvalidStatus(other.to_string())),
    }
}

/// Decimal or `0x` hex, range-checked into `T`.
fn parse_number<T: TryFrom<u64>>(what: &'static str, text: &str) -> Result<T, ParseError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };

    parsed
        .ok()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ParseError::InvalidNumber { what, value: text.to_string() })
}

#[cfg(test)]
mod tests {
    use boltlock_proto::ids::attributes;

    use super::*;

    #[test]
    fn parse_lock() {
        assert_eq!(parse("lock 1"), Command::Lock { endpoint: 1, pin: None });
        assert_eq!(parse("  unlock 2 1234 "), Command::Unlock { endpoint: 2, pin: Some("1234".into()) });
    }

    #[test]
    fn parse_lock_missing_endpoint() {
        assert!(matches!(parse("lock"), Command::InvalidArgs { command, .. } if command == "lock"));
    }

    #[test]
    fn parse_hex_ids() {
        assert_eq!(
            parse("cluster 0x0006 0x1 0x0 0x01"),
            Command::Attribute { cluster: clusters::ON_OFF, endpoint: 1, attribute: attributes::ON_OFF, value: 1 }
        );
        assert_eq!(
            parse("attr 2 0 0"),
            Command::Attribute { cluster: clusters::ON_OFF, endpoint: 2, attribute: 0, value: 0 }
        );
    }

    #[test]
    fn parse_out_of_range() {
        assert_eq!(
            parse("attr 1 0 256"),
            Command::InvalidArgs {
                command: "attr".into(),
                error: ParseError::InvalidNumber { what: "value", value: "256".into() },
            }
        );
        assert!(matches!(parse("lock 70000"), Command::InvalidArgs { .. }));
    }

    #[test]
    fn parse_set_user_defaults() {
        let Command::SetUser { slot, user } = parse("set-user 3 Alice 42") else {
            panic!("expected set-user");
        };
        assert_eq!(slot, 3);
        assert_eq!(user.name, "Alice");
        assert_eq!(user.unique_id, 42);
        assert_eq!(user.status, UserStatus::OccupiedEnabled);
        assert_eq!(user.user_type, UserType::UnrestrictedUser);
        assert!(user.credentials.is_empty());
    }

    #[test]
    fn parse_set_user_full() {
        let Command::SetUser { user, .. } = parse("set-user 1 Bob 7 disabled 0 2468") else {
            panic!("expected set-user");
        };
        assert_eq!(user.status, UserStatus::OccupiedDisabled);
        assert_eq!(user.credentials, vec![(CredentialType::Pin, b"2468".to_vec())]);
    }

    #[test]
    fn parse_set_user_bad_status() {
        assert!(matches!(
            parse("set-user 1 Bob 7 sleepy"),
            Command::InvalidArgs { error: ParseError::InvalidStatus(_), .. }
        ));
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse("get-user 0x0a"), Command::GetUser { slot: 10 });
        assert_eq!(parse("clear-user 2"), Command::ClearUser { slot: 2 });
        assert_eq!(parse("jam"), Command::Jam);
        assert_eq!(parse("status"), Command::Status);
        assert_eq!(parse("quit"), Command::Quit);
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse("   "), Command::Empty);
        assert!(matches!(parse("open sesame"), Command::Unknown { .. }));
    }

    #[test]
    fn commands_map_to_events() {
        assert_eq!(
            parse("unlock 1 2468").into_event(),
            Some(DeviceEvent::UnlockCommand { endpoint: 1, pin: Some(b"2468".to_vec()) })
        );
        assert_eq!(parse("status").into_event(), Some(DeviceEvent::QueryState));
        assert_eq!(parse("jam").into_event(), None);
    }
}
