//! Random operation sequences against a simulated device.
//!
//! Invariants checked after every sequence: at most one motion in flight,
//! only legal state transitions, and the device settles once the motor and
//! watchdog have had time to finish.

#![no_main]

use std::time::Duration;

use boltlock_core::{DeviceConfig, DeviceEvent, LockDevice, UserUpdate};
use boltlock_harness::{
    Operation, SimMotor,
    scenario::{World, oracle},
};
use boltlock_proto::{CredentialRule, CredentialType, UserStatus, UserType, ids};
use libfuzzer_sys::fuzz_target;

const MOTION: Duration = Duration::from_millis(300);

fn apply(world: &mut World, op: &Operation) {
    match *op {
        Operation::Lock { endpoint, pin } => world.apply(DeviceEvent::LockCommand {
            endpoint: u16::from(endpoint),
            pin: pin.map(|p| p.to_bytes()),
        }),
        Operation::Unlock { endpoint, pin } => world.apply(DeviceEvent::UnlockCommand {
            endpoint: u16::from(endpoint),
            pin: pin.map(|p| p.to_bytes()),
        }),
        Operation::WriteOnOff { endpoint, value } => world.apply(DeviceEvent::AttributeChanged {
            cluster: ids::clusters::ON_OFF,
            endpoint: u16::from(endpoint),
            attribute: ids::attributes::ON_OFF,
            value: vec![value],
        }),
        Operation::CompleteMotion { success } => {
            world.motor_mut().set_jammed(!success);
            world.advance(MOTION);
            world.motor_mut().set_jammed(false);
        },
        Operation::SetUser { slot, enabled, pin } => world.apply(DeviceEvent::SetUser {
            slot: u16::from(slot),
            user: UserUpdate {
                creator: 1,
                modifier: 1,
                name: format!("fuzz{slot}"),
                unique_id: u32::from(slot),
                status: if enabled { UserStatus::OccupiedEnabled } else { UserStatus::OccupiedDisabled },
                user_type: UserType::UnrestrictedUser,
                credential_rule: CredentialRule::Single,
                credentials: vec![(CredentialType::Pin, pin.to_bytes())],
            },
        }),
        Operation::ClearUser { slot } => world.apply(DeviceEvent::ClearUser { slot: u16::from(slot) }),
        Operation::GetUser { slot } => world.apply(DeviceEvent::GetUser { slot: u16::from(slot) }),
        Operation::AdvanceTime { millis } => world.advance(Duration::from_millis(u64::from(millis))),
    }
}

fuzz_target!(|ops: Vec<Operation>| {
    let config = DeviceConfig { actuator_timeout_ms: Some(1_000), auto_relock_ms: Some(1_500), ..Default::default() };
    let Ok(device) = LockDevice::new(config) else {
        return;
    };
    let mut world = World::new(device, SimMotor::new(MOTION, 0), Duration::from_millis(50));

    for op in ops.iter().take(256) {
        apply(&mut world, op);
    }
    // Long enough for any motion to complete or time out, and for a pending
    // auto-relock to run to completion.
    world.advance(Duration::from_secs(4));

    let check = oracle::all_of(vec![
        oracle::one_motion_at_a_time(),
        oracle::transitions_valid(),
        oracle::idle(),
    ]);
    if let Err(violation) = check(&world) {
        panic!("invariant violated: {violation}");
    }
});
