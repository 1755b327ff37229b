//! Property tests for correlation invariants.
//!
//! These drive the engine through arbitrary interleavings of dispatch,
//! results, cancellation and eviction and check the guarantees callers rely
//! on: callbacks run at most once, launches follow request order, and
//! identity-less results go to the oldest request.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{name, Harness, Outcomes, STD1, STD2, STD3};
use grant_relay::{names, AuthorizationName, Launch, RequestId};
use parking_lot::Mutex;
use proptest::prelude::*;

/// One host-side event applied to the engine.
#[derive(Debug, Clone)]
enum Op {
    Resolve { target: usize, granted: bool },
    Legacy { granted: bool },
    Special { target: usize },
    Cancel { target: usize },
    Advance { ms: u64 },
    Sweep,
}

// Strategy: operations against up to `requests` dispatched requests
fn arb_op(requests: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..requests, any::<bool>()).prop_map(|(target, granted)| Op::Resolve { target, granted }),
        any::<bool>().prop_map(|granted| Op::Legacy { granted }),
        (0..requests).prop_map(|target| Op::Special { target }),
        (0..requests).prop_map(|target| Op::Cancel { target }),
        prop_oneof![Just(0u64), 1u64..1_000, 299_000u64..400_000]
            .prop_map(|ms| Op::Advance { ms }),
        Just(Op::Sweep),
    ]
}

// Strategy: a shuffled mix of standard, already-granted and specialized names
fn arb_batch() -> impl Strategy<Value = Vec<&'static str>> {
    let pool = vec![
        STD1,
        STD2,
        STD3,
        "android.permission.INTERNET",
        names::SYSTEM_ALERT_WINDOW,
        names::WRITE_SETTINGS,
        names::PACKAGE_USAGE_STATS,
        names::SCHEDULE_EXACT_ALARM,
        names::BIND_NOTIFICATION_LISTENER_SERVICE,
    ];
    let len = pool.len();
    prop::sample::subsequence(pool, 0..=len).prop_shuffle()
}

fn is_standard(raw: &str) -> bool {
    [STD1, STD2, STD3].contains(&raw)
}

fn is_special(raw: &str) -> bool {
    AuthorizationName::new(raw).special().is_some()
}

proptest! {
    /// Property: no callback ever runs twice, and a request whose callback
    /// ran is never still pending
    #[test]
    fn proptest_callbacks_run_at_most_once(
        specials in prop::collection::vec(any::<bool>(), 1..6),
        ops in prop::collection::vec(arb_op(6), 0..40)
    ) {
        let h = Harness::new();
        let overlay = name(names::SYSTEM_ALERT_WINDOW);

        let dispatched: Vec<(RequestId, Outcomes)> = specials
            .iter()
            .map(|&special| {
                let outcomes = Outcomes::new();
                let batch = if special {
                    vec![overlay.clone(), name(STD1)]
                } else {
                    vec![name(STD1)]
                };
                (h.engine.request(&batch, outcomes.callback()), outcomes)
            })
            .collect();

        for op in ops {
            let target = |index: usize| dispatched[index % dispatched.len()].0;
            match op {
                Op::Resolve { target: index, granted } => {
                    h.engine.resolve_batch([(name(STD1), granted)], Some(&target(index)));
                }
                Op::Legacy { granted } => h.engine.resolve_batch([(name(STD1), granted)], None),
                Op::Special { target: index } => {
                    h.engine.resolve_single_special(&overlay, Some(&target(index)));
                }
                Op::Cancel { target: index } => h.engine.cancel(&target(index)),
                Op::Advance { ms } => h.clock.advance(Duration::from_millis(ms)),
                Op::Sweep => {
                    h.engine.sweep();
                }
            }
        }

        for (id, outcomes) in &dispatched {
            let pending = usize::from(h.engine.is_pending(id));
            prop_assert!(outcomes.count() <= 1, "callback for {} ran {} times", id, outcomes.count());
            prop_assert!(outcomes.count() + pending <= 1, "{} resolved but still pending", id);
        }
    }

    /// Property: standard names share one launch in request order and each
    /// specialized name gets its own launch, also in request order
    #[test]
    fn proptest_partition_preserves_request_order(batch in arb_batch()) {
        let h = Harness::new();
        let outcomes = Outcomes::new();
        let names: Vec<AuthorizationName> = batch.iter().copied().map(name).collect();

        let id = h.engine.request(&names, outcomes.callback());

        let expected_standard: Vec<AuthorizationName> =
            batch.iter().copied().filter(|raw| is_standard(raw)).map(name).collect();
        let expected_special: Vec<AuthorizationName> =
            batch.iter().copied().filter(|raw| is_special(raw)).map(name).collect();

        let mut standard = Vec::new();
        let mut special = Vec::new();
        for launch in h.launches.drain() {
            prop_assert_eq!(launch.request_id(), &id);
            match launch {
                Launch::Standard { names, .. } => standard.push(names),
                Launch::Special { name, .. } => special.push(name),
            }
        }

        if expected_standard.is_empty() && expected_special.is_empty() {
            prop_assert!(id.is_noop());
            prop_assert_eq!(outcomes.calls(), vec![Vec::<AuthorizationName>::new()]);
            prop_assert_eq!(h.engine.pending_count(), 0);
        } else {
            prop_assert!(!id.is_noop());
            prop_assert_eq!(outcomes.count(), 0);
            if expected_standard.is_empty() {
                prop_assert!(standard.is_empty());
            } else {
                prop_assert_eq!(standard, vec![expected_standard]);
            }
            prop_assert_eq!(special, expected_special);
        }
    }

    /// Property: identity-less results resolve requests oldest first, with
    /// ties going to the request dispatched first
    #[test]
    fn proptest_legacy_results_resolve_oldest_first(
        gaps in prop::collection::vec(0u64..3, 1..10)
    ) {
        let h = Harness::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (index, gap) in gaps.iter().enumerate() {
            h.clock.advance(Duration::from_millis(*gap));
            let order = Arc::clone(&order);
            h.engine.request(&[name(STD2)], move |_: Vec<AuthorizationName>| {
                order.lock().push(index);
            });
        }

        for _ in 0..gaps.len() {
            h.engine.resolve_batch([(name(STD2), false)], None);
        }

        let expected: Vec<usize> = (0..gaps.len()).collect();
        prop_assert_eq!(order.lock().clone(), expected);
        prop_assert_eq!(h.engine.pending_count(), 0);
    }
}
