//! Generic event loop.

use std::time::Duration;

use boltlock_core::{DeviceAction, DeviceEvent, LockDevice};
use tokio::time::MissedTickBehavior;

use crate::driver::Driver;

/// Runs a [`LockDevice`] over a [`Driver`].
///
/// One task, no shared state: the loop waits for either the driver's next
/// event or the tick timer, hands the event to the device and executes the
/// returned actions in order before waiting again.
#[derive(Debug)]
pub struct Runtime<D: Driver> {
    device: LockDevice,
    driver: D,
    tick: Duration,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime ticking the device's timers every `tick`.
    pub fn new(device: LockDevice, driver: D, tick: Duration) -> Self {
        Self { device, driver, tick: tick.max(Duration::from_millis(1)) }
    }

    /// Run until the driver reports end of input.
    ///
    /// # Errors
    ///
    /// Stops at the first driver error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(state = %self.device.state(), tick_ms = self.tick.as_millis(), "runtime started");

        loop {
            let event = tokio::select! {
                event = self.driver.next_event() => match event? {
                    Some(event) => event,
                    None => break,
                },
                _ = ticker.tick() => DeviceEvent::Tick,
            };

            self.process(event).await?;
        }

        self.driver.flush().await?;
        tracing::info!(state = %self.device.state(), "runtime stopped");
        Ok(())
    }

    /// Hand one event to the device and execute its actions.
    ///
    /// # Errors
    ///
    /// Stops at the first driver error; later actions are not executed.
    /// Output the driver queued while waiting is written first.
    pub async fn process(&mut self, event: DeviceEvent) -> Result<(), D::Error> {
        self.driver.flush().await?;

        let actions = self.device.handle(event, self.driver.now());

        for action in actions {
            match action {
                DeviceAction::DriveBolt(request) => self.driver.drive_bolt(request)?,
                DeviceAction::Notify(notification) => self.driver.publish(notification).await?,
                DeviceAction::Respond(response) => self.driver.respond(response).await?,
            }
        }
        Ok(())
    }

    /// The device being run.
    pub fn device(&self) -> &LockDevice {
        &self.device
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Take the device and driver back.
    pub fn into_parts(self) -> (LockDevice, D) {
        (self.device, self.driver)
    }
}
