#![no_main]
use libfuzzer_sys::fuzz_target;
use loadtach_core::mocks::{ErasedStorage, FixedLoadCell};
use loadtach_core::{Device, SharedState};
use loadtach_traits::clock::ManualClock;

fuzz_target!(|data: &[u8]| {
    // Arbitrary inbound bytes: every reply must be a single well-formed line.
    let shared = SharedState::default();
    let Ok(mut device) = Device::builder(&shared)
        .with_load_cell(FixedLoadCell(1234))
        .with_storage(ErasedStorage)
        .with_clock(ManualClock::new())
        .build()
    else {
        return;
    };
    for &b in data {
        if let Some(resp) = device.feed(b) {
            let line = resp.to_string();
            assert!(line.starts_with("OK ") || line.starts_with("ERR "));
            assert!(!line.contains('\n'));
        }
    }
});
