//! Reference model for model-based testing.
//!
//! [`ModelLock`] is a deliberately naive re-statement of the lock's
//! observable behaviour: plain fields, no actions, no request ids. Property
//! tests apply the same [`Operation`] sequence to the model and to a real
//! [`LockDevice`](boltlock_core::LockDevice) and require identical results
//! and identical observable state after every step.

mod lock;
mod operation;

pub use lock::{ModelLock, ObservableState};
pub use operation::{Operation, OperationError, OperationResult, SmallPin};
