//! Bus-facing vocabulary for the bolt-lock controller.
//!
//! The attribute bus addresses everything by small integers: endpoints,
//! clusters, attributes, fabrics. Door-lock enumerations (user status, user
//! type, credential rule, credential type, operation error) also travel as
//! single bytes. This crate names those numbers and nothing more; the state
//! machines that give them meaning live in `boltlock-core`.
//!
//! Every enumeration converts losslessly to and from its byte code. Unknown
//! codes are rejected with [`UnknownValue`] rather than mapped to a fallback.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod door_lock;
pub mod errors;
pub mod ids;

pub use door_lock::{CredentialRule, CredentialType, OperationError, UserStatus, UserType};
pub use errors::UnknownValue;
pub use ids::{AttributeId, ClusterId, EndpointId, FabricIndex};
