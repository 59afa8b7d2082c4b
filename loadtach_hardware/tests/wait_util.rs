use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use loadtach_hardware::error::HwError;
use loadtach_hardware::util::wait_until_low_with_timeout;
use rstest::rstest;

#[rstest]
fn returns_once_line_drops() {
    // Line reads high for the first three polls, then low.
    let polls = Arc::new(AtomicU32::new(0));
    let p = polls.clone();
    let res = wait_until_low_with_timeout(
        move || p.fetch_add(1, Ordering::Relaxed) < 3,
        Duration::from_millis(200),
        Duration::from_micros(100),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
    assert_eq!(polls.load(Ordering::Relaxed), 4);
}

#[rstest]
#[case(Duration::from_millis(2))]
#[case(Duration::from_millis(10))]
fn stuck_high_line_times_out(#[case] timeout: Duration) {
    let started = Instant::now();
    let err = wait_until_low_with_timeout(|| true, timeout, Duration::from_micros(200))
        .expect_err("expected timeout error");
    assert!(matches!(err, HwError::DataReadyTimeout), "got {err:?}");
    assert!(started.elapsed() >= timeout);
}
