//! The stored record awaiting an asynchronous result.

use std::fmt;

use parking_lot::Mutex;

use crate::authorization::AuthorizationName;
use crate::classifier::Classifier;
use crate::identity::RequestId;

type CompletionFn = Box<dyn FnOnce(Vec<AuthorizationName>) + Send + 'static>;

/// Single-use completion callback receiving the denied names.
///
/// The callback is consumed by [`invoke`](Self::invoke), so a record can
/// complete at most once. Dropping a `Completion` without invoking it is
/// how cancellation and eviction stay silent.
pub struct Completion {
    // Mutex only makes the boxed FnOnce Sync for the concurrent store.
    inner: Mutex<Option<CompletionFn>>,
}

impl Completion {
    /// Wraps a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Vec<AuthorizationName>) + Send + 'static,
    {
        Self {
            inner: Mutex::new(Some(Box::new(callback))),
        }
    }

    /// Runs the callback with the final denied names.
    pub fn invoke(self, denied: Vec<AuthorizationName>) {
        if let Some(callback) = self.inner.into_inner() {
            callback(denied);
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}

/// Results still outstanding for a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Awaiting {
    /// The standard batch was dispatched and has not reported.
    pub standard: bool,
    /// Specialized dispatches that have not reported.
    pub special: usize,
}

impl Awaiting {
    /// Returns `true` once nothing is outstanding.
    pub fn is_settled(&self) -> bool {
        !self.standard && self.special == 0
    }
}

/// A request awaiting its result.
///
/// `requested` holds the names that were not yet granted at dispatch time.
/// Reports received so far are kept with the grant state observed after the
/// live re-check, so the final denied set can be computed without trusting
/// the raw result.
#[derive(Debug)]
pub struct PendingRequest {
    id: RequestId,
    requested: Vec<AuthorizationName>,
    awaiting: Awaiting,
    reports: Vec<(AuthorizationName, bool)>,
    created_at_ms: u64,
    seq: u64,
    completion: Completion,
}

impl PendingRequest {
    /// Creates a record. Timestamps are assigned by the store on insertion.
    pub fn new(
        id: RequestId,
        requested: Vec<AuthorizationName>,
        awaiting: Awaiting,
        completion: Completion,
    ) -> Self {
        Self {
            id,
            requested,
            awaiting,
            reports: Vec::new(),
            created_at_ms: 0,
            seq: 0,
            completion,
        }
    }

    /// Returns the identity this record is stored under.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the names dispatched for this request, in request order.
    pub fn requested(&self) -> &[AuthorizationName] {
        &self.requested
    }

    /// Returns what is still outstanding.
    pub fn awaiting(&self) -> Awaiting {
        self.awaiting
    }

    /// Monotonic insertion time in milliseconds.
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn stamp(&mut self, created_at_ms: u64, seq: u64) {
        self.created_at_ms = created_at_ms;
        self.seq = seq;
    }

    /// Records a standard-channel result. `reports` carry re-checked grants.
    pub(crate) fn record_standard(&mut self, reports: Vec<(AuthorizationName, bool)>) {
        self.awaiting.standard = false;
        self.reports.extend(reports);
    }

    /// Records one specialized-channel result.
    pub(crate) fn record_special(&mut self, name: AuthorizationName, granted: bool) {
        self.awaiting.special = self.awaiting.special.saturating_sub(1);
        self.reports.push((name, granted));
    }

    fn reported(&self, name: &AuthorizationName) -> Option<bool> {
        self.reports
            .iter()
            .rev()
            .find(|(reported, _)| reported == name)
            .map(|(_, granted)| *granted)
    }

    /// Computes the final denied set.
    ///
    /// Requested names come first in request order: a reported name is denied
    /// if its report was a denial, an unreported one if it is still not
    /// granted. Names reported denied that were never requested follow in
    /// report order.
    pub fn denied(&self, classifier: &dyn Classifier) -> Vec<AuthorizationName> {
        let mut denied: Vec<AuthorizationName> = self
            .requested
            .iter()
            .filter(|name| match self.reported(name) {
                Some(granted) => !granted,
                None => !classifier.is_granted(name),
            })
            .cloned()
            .collect();

        for (name, granted) in &self.reports {
            if !granted && !self.requested.contains(name) && !denied.contains(name) {
                denied.push(name.clone());
            }
        }
        denied
    }

    /// Consumes the record and runs its callback.
    pub fn complete(self, denied: Vec<AuthorizationName>) {
        self.completion.invoke(denied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{GrantTable, ProtectionLevel};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn names(raw: &[&str]) -> Vec<AuthorizationName> {
        raw.iter().copied().map(AuthorizationName::from).collect()
    }

    fn table(dangerous: &[&str]) -> GrantTable {
        let table = GrantTable::new();
        for name in dangerous {
            table.set_protection(*name, ProtectionLevel::Dangerous);
        }
        table
    }

    fn record(requested: &[&str]) -> PendingRequest {
        PendingRequest::new(
            RequestId::generate(),
            names(requested),
            Awaiting {
                standard: true,
                special: 0,
            },
            Completion::new(|_| {}),
        )
    }

    #[test]
    fn completion_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let completion = Completion::new(move |denied| {
            assert!(denied.is_empty());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        completion.invoke(Vec::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_completion_never_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        drop(Completion::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn denied_follows_request_order() {
        let classifier = table(&["a", "b", "c"]);
        let mut pending = record(&["a", "b", "c"]);
        pending.record_standard(vec![
            ("c".into(), false),
            ("b".into(), true),
            ("a".into(), false),
        ]);

        assert_eq!(pending.denied(&classifier), names(&["a", "c"]));
    }

    #[test]
    fn unreported_names_use_live_state() {
        let classifier = table(&["a", "b"]);
        classifier.grant("b");
        let mut pending = record(&["a", "b"]);
        pending.record_standard(Vec::new());

        assert_eq!(pending.denied(&classifier), names(&["a"]));
    }

    #[test]
    fn unrequested_denials_are_appended() {
        let classifier = table(&["a", "z"]);
        let mut pending = record(&["a"]);
        pending.record_standard(vec![("z".into(), false), ("a".into(), true)]);

        assert_eq!(pending.denied(&classifier), names(&["z"]));
    }

    #[test]
    fn later_report_overrides_earlier_one() {
        let classifier = table(&["a"]);
        let mut pending = record(&["a"]);
        pending.record_special("a".into(), false);
        pending.record_special("a".into(), true);

        assert!(pending.denied(&classifier).is_empty());
    }

    #[test]
    fn awaiting_settles_after_all_reports() {
        let mut pending = PendingRequest::new(
            RequestId::generate(),
            names(&["s1", "s2", "std"]),
            Awaiting {
                standard: true,
                special: 2,
            },
            Completion::new(|_| {}),
        );

        pending.record_special("s1".into(), true);
        assert!(!pending.awaiting().is_settled());
        pending.record_standard(vec![("std".into(), true)]);
        assert!(!pending.awaiting().is_settled());
        pending.record_special("s2".into(), true);
        assert!(pending.awaiting().is_settled());

        // Extra reports never underflow.
        pending.record_special("s2".into(), true);
        assert_eq!(pending.awaiting().special, 0);
    }
}
