//! The reference lock.

use boltlock_core::LockState;

use super::operation::{Operation, OperationError, OperationResult, SmallPin};

/// Endpoints the model treats as carrying the lock.
const LOCK_ENDPOINTS: [u8; 2] = [1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelUser {
    enabled: bool,
    pin: SmallPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Motion {
    lock: bool,
    started_ms: u64,
}

/// What the model and the real device must agree on after every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Lock state
    pub state: LockState,
    /// Whether a motion is unfinished
    pub in_flight: bool,
    /// Occupied slots, ascending
    pub occupied: Vec<u16>,
}

/// Reference model of one lock.
#[derive(Debug, Clone)]
pub struct ModelLock {
    state: LockState,
    motion: Option<Motion>,
    users: Vec<Option<ModelUser>>,
    require_pin: bool,
    watchdog_ms: u64,
    now_ms: u64,
}

impl ModelLock {
    /// A locked, idle model with `slots` empty user slots.
    #[must_use]
    pub fn new(slots: u8, require_pin: bool, watchdog_ms: u64) -> Self {
        Self {
            state: LockState::Locked,
            motion: None,
            users: vec![None; usize::from(slots)],
            require_pin,
            watchdog_ms,
            now_ms: 0,
        }
    }

    /// Current lock state.
    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Snapshot for comparison with the real device.
    #[must_use]
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            state: self.state,
            in_flight: self.motion.is_some(),
            occupied: self
                .users
                .iter()
                .enumerate()
                .filter(|(_, user)| user.is_some())
                .map(|(index, _)| index as u16 + 1)
                .collect(),
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match *op {
            Operation::Lock { pin, .. } => self.door_command(true, pin),
            Operation::Unlock { pin, .. } => self.door_command(false, pin),
            Operation::WriteOnOff { endpoint, value } => {
                if !LOCK_ENDPOINTS.contains(&endpoint) {
                    return OperationResult::Error(OperationError::UnhandledEndpoint);
                }
                self.initiate(value != 0)
            },
            Operation::CompleteMotion { success } => self.complete(success),
            Operation::SetUser { slot, enabled, pin } => match self.slot_mut(slot) {
                Some(entry) => {
                    *entry = Some(ModelUser { enabled, pin });
                    OperationResult::Ok
                },
                None => OperationResult::Error(OperationError::InvalidSlot),
            },
            Operation::ClearUser { slot } => match self.slot_mut(slot) {
                Some(entry) => {
                    *entry = None;
                    OperationResult::Ok
                },
                None => OperationResult::Error(OperationError::InvalidSlot),
            },
            Operation::GetUser { slot } => match self.slot_mut(slot) {
                Some(_) => OperationResult::Ok,
                None => OperationResult::Error(OperationError::InvalidSlot),
            },
            Operation::AdvanceTime { millis } => {
                self.now_ms += u64::from(millis);
                if let Some(motion) = self.motion {
                    if self.now_ms - motion.started_ms >= self.watchdog_ms {
                        let _ = self.complete(false);
                    }
                }
                OperationResult::Ok
            },
        }
    }

    fn door_command(&mut self, lock: bool, pin: Option<SmallPin>) -> OperationResult {
        match pin {
            Some(pin) => {
                let digits = pin.to_bytes();
                let owners = self.users.iter().flatten().filter(|user| user.pin.to_bytes() == digits);
                let (mut enabled, mut disabled) = (false, false);
                for owner in owners {
                    enabled |= owner.enabled;
                    disabled |= !owner.enabled;
                }
                if !enabled {
                    let error = if disabled {
                        OperationError::DisabledUser
                    } else {
                        OperationError::InvalidCredential
                    };
                    return OperationResult::Error(error);
                }
            },
            None if self.require_pin => {
                return OperationResult::Error(OperationError::InvalidCredential);
            },
            None => {},
        }

        self.initiate(lock)
    }

    fn initiate(&mut self, lock: bool) -> OperationResult {
        match (self.state, lock) {
            (LockState::Locked, true) | (LockState::Unlocked, false) => OperationResult::Ok,
            (LockState::Locked, false) => {
                self.state = LockState::Unlocking;
                self.motion = Some(Motion { lock, started_ms: self.now_ms });
                OperationResult::Ok
            },
            (LockState::Unlocked, true) => {
                self.state = LockState::Locking;
                self.motion = Some(Motion { lock, started_ms: self.now_ms });
                OperationResult::Ok
            },
            (LockState::Locking | LockState::Unlocking, _) => {
                OperationResult::Error(OperationError::Busy)
            },
        }
    }

    fn complete(&mut self, success: bool) -> OperationResult {
        let Some(motion) = self.motion.take() else {
            return OperationResult::Error(OperationError::NothingInFlight);
        };

        self.state = match (motion.lock, success) {
            (true, true) | (false, false) => LockState::Locked,
            (true, false) | (false, true) => LockState::Unlocked,
        };
        OperationResult::Ok
    }

    fn slot_mut(&mut self, slot: u8) -> Option<&mut Option<ModelUser>> {
        let index = usize::from(slot).checked_sub(1)?;
        self.users.get_mut(index)
    }
}
