//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O. Each
//! frontend implements it to deliver bus events, move the bolt and publish
//! results, while the generic [`crate::Runtime`] handles orchestration.

use std::{future::Future, time::Instant};

use boltlock_core::{ActionRequest, DeviceEvent, Notification, Response};

/// Abstracts I/O operations for the lock runtime.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` when input is exhausted and the runtime should stop.
    /// Must be cancel safe: the runtime races it against its tick timer, so
    /// any output it produces has to be queued for [`flush`](Self::flush)
    /// rather than written here.
    fn next_event(&mut self) -> impl Future<Output = Result<Option<DeviceEvent>, Self::Error>> + Send;

    /// Start moving the bolt.
    ///
    /// Must return without waiting for the motion. The result comes back
    /// later as a [`DeviceEvent::ActuatorComplete`] from
    /// [`next_event`](Self::next_event).
    ///
    /// # Errors
    ///
    /// Returns an error if the motor cannot be commanded.
    fn drive_bolt(&mut self, request: ActionRequest) -> Result<(), Self::Error>;

    /// Publish a notification to the bus.
    fn publish(
        &mut self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Reply to the request that produced `response`.
    fn respond(&mut self, response: Response) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Write output queued by [`next_event`](Self::next_event).
    ///
    /// Called outside the event race, before each event is processed and
    /// once more when the runtime stops.
    fn flush(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async { Ok(()) }
    }

    /// Current time instant.
    fn now(&self) -> Instant;
}
