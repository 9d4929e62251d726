//! Async runtime for the bolt-lock core
//!
//! A thin async shell over [`boltlock_core::LockDevice`]. All lock logic
//! lives in the core; this crate feeds it events and carries out the actions
//! it returns.
//!
//! # Components
//!
//! - [`Driver`]: trait for platform-specific I/O (bus, motor, clock)
//! - [`Runtime`]: generic event loop over a driver
//! - [`ConsoleDriver`]: line-oriented console frontend with a simulated motor
//! - [`console`]: console command parsing

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod console;
mod console_driver;
mod driver;
mod error;
mod runtime;

pub use console::{Command, ParseError};
pub use console_driver::{ConsoleDriver, ConsoleInput};
pub use driver::Driver;
pub use error::AppError;
pub use runtime::Runtime;
