//! Deterministic simulation harness for the bolt-lock core.
//!
//! Drives a [`LockDevice`](boltlock_core::LockDevice) against a virtual clock
//! and a simulated bolt motor, so tests control exactly when motions finish,
//! fail or go missing.
//!
//! - [`scenario`]: declarative scenario tests with a mandatory oracle
//! - [`model`]: reference model for model-based property tests
//! - [`SimMotor`]: virtual motor with seeded fault injection
//! - [`SimClock`]: virtual monotonic clock

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scenario;
pub mod sim_clock;
pub mod sim_motor;

pub use model::{ModelLock, Operation, OperationError, OperationResult, SmallPin};
pub use sim_clock::SimClock;
pub use sim_motor::{MotorCompletion, SimMotor};
