use loadtach_core::{PulseState, SharedState, TachCapture, TachSnapshot, compute_rpm};
use proptest::prelude::*;
use rstest::rstest;

fn snap(last_period: u32) -> TachSnapshot {
    TachSnapshot {
        pulses_total: 5,
        last_period,
    }
}

#[rstest]
#[case(10_000, 2, 3000.0)]
#[case(60_000, 1, 1000.0)]
#[case(1_000_000, 1, 60.0)]
#[case(500, 4, 30_000.0)]
fn rpm_from_period(#[case] period: u32, #[case] ppr: u32, #[case] want: f32) {
    let rpm = compute_rpm(snap(period), ppr);
    assert!((rpm - want).abs() / want < 1e-5, "rpm {rpm} != {want}");
}

#[rstest]
#[case(0, 1)]
#[case(0, 8)]
#[case(10_000, 0)]
#[case(u32::MAX, 0)]
fn rpm_is_zero_without_period_or_ppr(#[case] period: u32, #[case] ppr: u32) {
    assert_eq!(compute_rpm(snap(period), ppr), 0.0);
}

#[rstest]
fn debounce_keeps_period_below_threshold() {
    let cap = TachCapture::new(100);
    cap.on_edge(1_000);
    cap.on_edge(2_000);
    assert_eq!(cap.snapshot().last_period, 1_000);

    cap.on_edge(2_050);
    assert_eq!(cap.snapshot().last_period, 1_000);

    cap.on_edge(2_200);
    assert_eq!(cap.snapshot().last_period, 150);
    assert_eq!(cap.snapshot().pulses_total, 4);
}

#[rstest]
fn stopped_shaft_keeps_last_rate() {
    let shared = SharedState::default();
    shared.tach().on_edge(1_000);
    shared.tach().on_edge(11_000);
    // No further edges: the reading does not decay.
    let s = shared.tach().snapshot();
    assert!((s.rpm(2) - 3000.0).abs() < 1e-3);
}

proptest! {
    #[test]
    fn every_edge_counts_and_period_is_last_accepted_interval(
        start in 1u32..u32::MAX,
        gaps in proptest::collection::vec(0u32..5_000, 1..64),
    ) {
        let mut s = PulseState::new().on_edge(start, 100);
        let mut ts = start;
        let mut want_period = 0u32;
        for gap in &gaps {
            ts = ts.wrapping_add(*gap);
            let prev_edge = s.last_edge_time;
            s = s.on_edge(ts, 100);
            if prev_edge != 0 && *gap > 100 {
                want_period = *gap;
            }
        }
        prop_assert_eq!(s.pulses_total as usize, gaps.len() + 1);
        prop_assert_eq!(s.last_edge_time, ts);
        prop_assert_eq!(s.last_period, want_period);
    }
}

#[rstest]
fn snapshots_are_never_torn() {
    // Interval before edge k is 200 + k, so a consistent snapshot with
    // n >= 2 pulses always has last_period == 200 + n.
    const EDGES: u32 = 20_000;
    let shared = SharedState::default();
    std::thread::scope(|scope| {
        let edge_source = scope.spawn(|| {
            let mut ts: u32 = 1_000;
            shared.tach().on_edge(ts);
            for k in 2..=EDGES {
                ts += 200 + k;
                shared.tach().on_edge(ts);
            }
        });

        let mut last_pulses = 0;
        while !edge_source.is_finished() {
            let s = shared.tach().snapshot();
            assert!(s.pulses_total >= last_pulses);
            if s.pulses_total >= 2 {
                assert_eq!(s.last_period, 200 + s.pulses_total, "torn snapshot {s:?}");
            }
            last_pulses = s.pulses_total;
        }
    });
    assert_eq!(shared.tach().snapshot().pulses_total, EDGES);
}
