//! Scenario testing with a mandatory oracle.
//!
//! A scenario is a configured device, a virtual motor and a list of steps
//! (bus events, clock advances, motor jams). After the steps run, the oracle
//! inspects the final [`World`] and decides whether the scenario passed. A
//! scenario without an oracle cannot be run.

pub mod builder;
pub mod oracle;
pub mod world;

pub use builder::{RunnableScenario, Scenario, Step};
pub use world::World;

/// Verification run against the final world.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
