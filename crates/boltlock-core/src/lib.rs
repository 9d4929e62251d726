//! Bolt-lock controller core logic
//!
//! Pure state machine logic for a door-lock controller, completely decoupled
//! from the attribute bus and from the motor hardware.
//!
//! # Architecture
//!
//! Every component here is a deterministic state machine that performs no
//! I/O, reads no clock and spawns nothing. The current instant is passed in
//! by the caller where a component needs it.
//!
//! State transitions produce declarative actions ("drive the bolt", "the lock
//! state changed", "this request finished") rather than executing them. A
//! runtime or test harness interprets the actions: production drives a motor
//! and publishes to the bus, the simulation harness advances a virtual motor
//! and records what was published.
//!
//! # Components
//!
//! - [`credentials`]: fixed-slot user/credential store
//! - [`actuator`]: lock actuator state machine (one motion at a time)
//! - [`gateway`]: validation and routing of bus triggers
//! - [`timers`]: motion watchdog and auto-relock timer
//! - [`device`]: composition of the above behind one event/action interface
//! - [`config`]: device configuration
//! - [`error`]: error types
//! - [`bounded`]: fixed-capacity buffers

pub mod actuator;
pub mod bounded;
pub mod config;
pub mod credentials;
pub mod device;
pub mod error;
pub mod gateway;
pub mod timers;

pub use actuator::{
    ActionOutcome, ActionRequest, ActuatorAction, ActuatorStateMachine, InitiateOutcome,
    LockAction, LockState, RequestId, TriggerSource,
};
pub use config::{BootState, DeviceConfig};
pub use credentials::{CredentialStore, NewCredential, NewUser, PinCheck, UserRecord};
pub use device::{DeviceAction, DeviceEvent, LockDevice, Notification, Response, UserUpdate};
pub use error::{ActuatorError, ConfigError, CredentialError, InvalidArgument, RoutingError};
pub use gateway::{AttributeDisposition, CommandGateway, CommandResponse, GatewayReply, UserLookup};
