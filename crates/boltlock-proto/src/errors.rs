//! Conversion errors for bus enumerations.

use thiserror::Error;

/// A byte code that does not name any variant of the target enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code {value:#04x}")]
pub struct UnknownValue {
    /// Name of the enumeration being decoded.
    pub kind: &'static str,
    /// The offending byte.
    pub value: u8,
}
