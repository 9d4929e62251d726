//! Reusable oracles.
//!
//! Each function returns an [`OracleFn`]; combine them with [`all_of`].

use boltlock_core::{ActionOutcome, DeviceAction, LockState, Notification, Response, UserLookup};
use boltlock_proto::OperationError;

use crate::scenario::OracleFn;

/// Every oracle must pass.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}

/// The lock ends in `expected`.
pub fn final_state(expected: LockState) -> OracleFn {
    Box::new(move |world| {
        let actual = world.device().state();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected final state {expected}, got {actual}"))
        }
    })
}

/// Nothing is moving at the end.
pub fn idle() -> OracleFn {
    Box::new(|world| match world.device().actuator().in_flight() {
        None => Ok(()),
        Some(request) => Err(format!("request {} still in flight", request.id)),
    })
}

/// Exactly `expected` motions were started.
pub fn drive_count(expected: usize) -> OracleFn {
    Box::new(move |world| {
        let actual = world.drives().len();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} motions, got {actual}"))
        }
    })
}

/// Published lock states match `expected` exactly.
pub fn state_history(expected: Vec<LockState>) -> OracleFn {
    Box::new(move |world| {
        let actual = world.state_history();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected state history {expected:?}, got {actual:?}"))
        }
    })
}

/// Exactly `expected` motions ended in a fault.
pub fn fault_count(expected: usize) -> OracleFn {
    Box::new(move |world| {
        let actual = world
            .action_results()
            .iter()
            .filter(|(_, outcome)| *outcome == ActionOutcome::Fault)
            .count();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} faults, got {actual}"))
        }
    })
}

/// A motion is never started while another is unfinished, and every
/// finished motion is the one that was started.
pub fn one_motion_at_a_time() -> OracleFn {
    Box::new(|world| {
        let mut open = None;

        for action in world.trace() {
            match action {
                DeviceAction::DriveBolt(request) => {
                    if let Some(previous) = open {
                        return Err(format!(
                            "request {} started while {previous} was in flight",
                            request.id
                        ));
                    }
                    open = Some(request.id);
                },
                DeviceAction::Notify(Notification::ActionResult { request, .. }) => {
                    if open != Some(request.id) {
                        return Err(format!("result for {} which was not in flight", request.id));
                    }
                    open = None;
                },
                _ => {},
            }
        }
        Ok(())
    })
}

/// Every published state is one the lock can legally move to.
pub fn transitions_valid() -> OracleFn {
    Box::new(|world| {
        let mut current: LockState = world.device().config().boot_state.into();

        for next in world.state_history() {
            let legal = matches!(
                (current, next),
                (LockState::Locked, LockState::Unlocking)
                    | (LockState::Unlocked, LockState::Locking)
                    | (LockState::Locking | LockState::Unlocking, LockState::Locked | LockState::Unlocked)
            );

            if !legal {
                return Err(format!("illegal transition {current} -> {next}"));
            }
            current = next;
        }
        Ok(())
    })
}

/// The most recent command was refused with `expected`.
pub fn last_command_refused(expected: OperationError) -> OracleFn {
    Box::new(move |world| match world.last_response() {
        Some(Response::Command { response, .. }) if !response.accepted => {
            if response.error == Some(expected) {
                Ok(())
            } else {
                Err(format!("expected refusal {expected:?}, got {:?}", response.error))
            }
        },
        other => Err(format!("expected a refused command, last response was {other:?}")),
    })
}

/// `slot` holds a user.
pub fn user_present(slot: u16) -> OracleFn {
    Box::new(move |world| match world.device().credentials().get_user(slot) {
        Ok(record) if record.is_occupied() => Ok(()),
        Ok(_) => Err(format!("slot {slot} is empty")),
        Err(e) => Err(e.to_string()),
    })
}

/// The most recent reply is a user lookup that found nothing.
pub fn last_lookup_empty() -> OracleFn {
    Box::new(|world| match world.last_response() {
        Some(Response::User { result: Ok(UserLookup::NotFound), .. }) => Ok(()),
        other => Err(format!("expected an empty lookup, got {other:?}")),
    })
}
