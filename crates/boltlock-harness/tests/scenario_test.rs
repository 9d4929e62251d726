//! Scenario tests for the lock's documented behaviour.

use std::time::Duration;

use boltlock_core::{
    BootState, CommandResponse, DeviceAction, DeviceConfig, DeviceEvent, InitiateOutcome,
    LockState, Notification, RequestId, Response, UserUpdate,
};
use boltlock_harness::scenario::{Scenario, oracle};
use boltlock_proto::{CredentialRule, CredentialType, OperationError, UserStatus, UserType, ids};

fn unlocked() -> DeviceConfig {
    DeviceConfig { boot_state: BootState::Unlocked, ..Default::default() }
}

fn user(name: &str, status: UserStatus, pin: &str) -> UserUpdate {
    UserUpdate {
        creator: 1,
        modifier: 1,
        name: name.to_string(),
        unique_id: 42,
        status,
        user_type: UserType::UnrestrictedUser,
        credential_rule: CredentialRule::Single,
        credentials: vec![(CredentialType::Pin, pin.as_bytes().to_vec())],
    }
}

#[test]
fn attribute_write_locks_once() {
    let result = Scenario::new("attribute lock")
        .config(unlocked())
        .write_on_off(1, 0x01)
        .settle()
        .oracle(oracle::all_of(vec![
            oracle::final_state(LockState::Locked),
            oracle::drive_count(1),
            oracle::state_history(vec![LockState::Locking, LockState::Locked]),
            oracle::idle(),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn second_lock_command_is_busy() {
    let result = Scenario::new("double lock")
        .config(unlocked())
        .lock(1)
        .lock(1)
        .oracle(Box::new(|world| {
            let replies: Vec<CommandResponse> = world
                .responses()
                .into_iter()
                .filter_map(|r| match r {
                    Response::Command { response, .. } => Some(*response),
                    _ => None,
                })
                .collect();

            assert_eq!(replies.len(), 2);
            assert!(replies[0].accepted);
            assert_eq!(replies[0].outcome, Some(InitiateOutcome::Started(RequestId(1))));
            assert!(!replies[1].accepted);
            assert_eq!(replies[1].outcome, Some(InitiateOutcome::Busy));
            assert_eq!(replies[1].error, Some(OperationError::Busy));
            assert_eq!(world.drives().len(), 1);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn unknown_attribute_is_ignored() {
    let result = Scenario::new("unknown attribute")
        .event(DeviceEvent::AttributeChanged {
            cluster: ids::clusters::ON_OFF,
            endpoint: 1,
            attribute: 0x4000,
            value: vec![0x00],
        })
        .settle()
        .oracle(oracle::all_of(vec![
            oracle::final_state(LockState::Locked),
            oracle::drive_count(0),
            oracle::state_history(vec![]),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn foreign_cluster_and_endpoint_are_ignored() {
    // Door Lock cluster: its commands arrive as events, not attribute writes.
    const DOOR_LOCK: u32 = 0x0101;

    let result = Scenario::new("misaddressed writes")
        .event(DeviceEvent::AttributeChanged {
            cluster: DOOR_LOCK,
            endpoint: 1,
            attribute: ids::attributes::ON_OFF,
            value: vec![0x00],
        })
        .write_on_off(9, 0x00)
        .settle()
        .oracle(oracle::all_of(vec![oracle::final_state(LockState::Locked), oracle::drive_count(0)]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn lock_while_locked_does_nothing() {
    let result = Scenario::new("already locked")
        .lock(1)
        .write_on_off(2, 0x01)
        .oracle(oracle::all_of(vec![
            oracle::final_state(LockState::Locked),
            oracle::drive_count(0),
            oracle::state_history(vec![]),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn pin_protected_unlock() {
    let config = DeviceConfig { require_pin_for_remote: true, ..Default::default() };

    let refused = Scenario::new("wrong pin")
        .config(config.clone())
        .event(DeviceEvent::SetUser { slot: 1, user: user("Alice", UserStatus::OccupiedEnabled, "2468") })
        .unlock_with_pin(1, "1357")
        .oracle(oracle::all_of(vec![
            oracle::last_command_refused(OperationError::InvalidCredential),
            oracle::drive_count(0),
        ]))
        .run();
    assert!(refused.is_ok(), "scenario should succeed: {refused:?}");

    let missing = Scenario::new("missing pin")
        .config(config.clone())
        .unlock(1)
        .oracle(oracle::last_command_refused(OperationError::InvalidCredential))
        .run();
    assert!(missing.is_ok(), "scenario should succeed: {missing:?}");

    let accepted = Scenario::new("right pin")
        .config(config)
        .event(DeviceEvent::SetUser { slot: 1, user: user("Alice", UserStatus::OccupiedEnabled, "2468") })
        .unlock_with_pin(1, "2468")
        .settle()
        .oracle(oracle::all_of(vec![oracle::final_state(LockState::Unlocked), oracle::drive_count(1)]))
        .run();
    assert!(accepted.is_ok(), "scenario should succeed: {accepted:?}");
}

#[test]
fn disabled_user_is_denied() {
    let result = Scenario::new("disabled user")
        .event(DeviceEvent::SetUser { slot: 3, user: user("Bob", UserStatus::OccupiedDisabled, "1111") })
        .unlock_with_pin(1, "1111")
        .oracle(oracle::all_of(vec![
            oracle::user_present(3),
            oracle::last_command_refused(OperationError::DisabledUserDenied),
            oracle::final_state(LockState::Locked),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn cleared_user_lookup_is_empty() {
    let result = Scenario::new("clear user")
        .event(DeviceEvent::SetUser { slot: 2, user: user("Carol", UserStatus::OccupiedEnabled, "9999") })
        .event(DeviceEvent::ClearUser { slot: 2 })
        .event(DeviceEvent::GetUser { slot: 2 })
        .oracle(oracle::last_lookup_empty())
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn auto_relock_after_delay() {
    let config = DeviceConfig { auto_relock_ms: Some(3_000), ..Default::default() };

    let result = Scenario::new("auto relock")
        .config(config)
        .unlock(2)
        .settle()
        .advance(Duration::from_secs(3))
        .settle()
        .oracle(Box::new(|world| {
            assert_eq!(world.device().state(), LockState::Locked);
            assert_eq!(
                world.state_history(),
                vec![LockState::Unlocking, LockState::Unlocked, LockState::Locking, LockState::Locked]
            );

            let drives = world.drives();
            assert_eq!(drives.len(), 2);
            assert_eq!(drives[1].source, boltlock_core::TriggerSource::AutoRelock);
            assert_eq!(drives[1].endpoint, 2);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn every_published_transition_is_legal() {
    let result = Scenario::new("mixed traffic")
        .config(unlocked())
        .lock(1)
        .unlock(1)
        .settle()
        .unlock(1)
        .settle()
        .write_on_off(2, 0x01)
        .advance(Duration::from_millis(100))
        .lock(2)
        .settle()
        .oracle(oracle::all_of(vec![
            oracle::transitions_valid(),
            oracle::one_motion_at_a_time(),
            oracle::final_state(LockState::Locked),
            oracle::drive_count(3),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn lock_state_notified_exactly_once_per_settle() {
    let result = Scenario::new("single settle notification")
        .config(unlocked())
        .write_on_off(1, 0x01)
        .settle()
        .advance(Duration::from_secs(30))
        .oracle(Box::new(|world| {
            let locked = world
                .trace()
                .iter()
                .filter(|a| {
                    matches!(
                        a,
                        DeviceAction::Notify(Notification::LockStateChanged { state: LockState::Locked })
                    )
                })
                .count();
            assert_eq!(locked, 1);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}
