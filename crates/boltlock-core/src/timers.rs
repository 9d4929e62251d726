//! Timers driven by the device around the actuator state machine.
//!
//! Both timers are pure: they store deadlines and are polled with the
//! current instant. Neither touches the actuator; the device decides what to
//! do when one fires.
//!
//! - [`Watchdog`]: a motion that has not completed within the timeout is
//!   treated as failed. The actuator state machine has no timeout of its
//!   own, so without a watchdog a lost completion leaves the lock
//!   transitional forever.
//! - [`AutoRelock`]: relock a fixed delay after an unlock completes.

use std::time::{Duration, Instant};

use boltlock_proto::EndpointId;

use crate::actuator::RequestId;

/// Motion watchdog.
#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout: Duration,
    armed: Option<(RequestId, Instant)>,
}

impl Watchdog {
    /// Create a disarmed watchdog.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, armed: None }
    }

    /// Start watching `request`, replacing any previous one.
    pub fn arm(&mut self, request: RequestId, now: Instant) {
        self.armed = Some((request, now + self.timeout));
    }

    /// Stop watching `request`. A different armed request is left alone.
    pub fn disarm(&mut self, request: RequestId) {
        if matches!(self.armed, Some((armed, _)) if armed == request) {
            self.armed = None;
        }
    }

    /// Request being watched, if any.
    #[must_use]
    pub fn armed(&self) -> Option<RequestId> {
        self.armed.map(|(request, _)| request)
    }

    /// Return the watched request if its deadline has passed.
    ///
    /// Fires at most once per arm.
    pub fn poll(&mut self, now: Instant) -> Option<RequestId> {
        match self.armed {
            Some((request, deadline)) if now >= deadline => {
                self.armed = None;
                Some(request)
            },
            _ => None,
        }
    }
}

/// Auto-relock timer.
#[derive(Debug, Clone)]
pub struct AutoRelock {
    delay: Duration,
    armed: Option<(EndpointId, Instant)>,
}

impl AutoRelock {
    /// Create a disarmed timer.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, armed: None }
    }

    /// Relock `endpoint` after the delay.
    pub fn arm(&mut self, endpoint: EndpointId, now: Instant) {
        self.armed = Some((endpoint, now + self.delay));
    }

    /// Forget any pending relock.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// Whether a relock is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Return the endpoint to relock if the delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<EndpointId> {
        match self.armed {
            Some((endpoint, deadline)) if now >= deadline => {
                self.armed = None;
                Some(endpoint)
            },
            _ => None,
        }
    }
}
