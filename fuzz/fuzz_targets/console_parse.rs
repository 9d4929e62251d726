//! Arbitrary console input must parse without panicking, and every command
//! that maps to a device event must be accepted by a device.

#![no_main]

use std::time::Instant;

use boltlock_app::console;
use boltlock_core::{DeviceConfig, LockDevice};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let Ok(mut device) = LockDevice::new(DeviceConfig::default()) else {
        return;
    };

    for line in input.lines() {
        if let Some(event) = console::parse(line).into_event() {
            let _ = device.handle(event, Instant::now());
        }
    }
});
