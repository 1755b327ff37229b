//! Bounded in-memory record of request lifecycle transitions.
//!
//! The journal is diagnostic only. It records what happened to each
//! identity so hosts can inspect recent traffic without installing a
//! tracing subscriber; nothing in the engine reads it back.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

use crate::authorization::AuthorizationName;
use crate::identity::RequestId;

/// Lifecycle transition of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleKind {
    /// Nothing needed dispatching; the callback ran synchronously.
    ShortCircuited {
        /// Names reported denied to the callback.
        denied: Vec<AuthorizationName>,
    },
    /// A record was stored and external flows were triggered.
    Dispatched,
    /// A result arrived and the callback ran.
    Resolved {
        /// Names reported denied to the callback.
        denied: Vec<AuthorizationName>,
    },
    /// A partial result was recorded; more are outstanding.
    Progressed,
    /// The caller cancelled the request.
    Cancelled,
    /// The request was swept as abandoned.
    Evicted,
    /// A result found no matching request.
    ///
    /// Cancelling an unknown identity is not journaled.
    Missed,
    /// The store refused the record; the callback ran synchronously.
    Failed,
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleKind::ShortCircuited { .. } => write!(f, "short_circuited"),
            LifecycleKind::Dispatched => write!(f, "dispatched"),
            LifecycleKind::Resolved { .. } => write!(f, "resolved"),
            LifecycleKind::Progressed => write!(f, "progressed"),
            LifecycleKind::Cancelled => write!(f, "cancelled"),
            LifecycleKind::Evicted => write!(f, "evicted"),
            LifecycleKind::Missed => write!(f, "missed"),
            LifecycleKind::Failed => write!(f, "failed"),
        }
    }
}

/// One journal entry.
///
/// Eviction sweeps are recorded as a single entry with the no-op identity
/// and the evicted count in `count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    request_id: RequestId,
    kind: LifecycleKind,
    names: Vec<AuthorizationName>,
    count: usize,
    at_ms: u64,
}

impl LifecycleEvent {
    /// Creates an event for `request_id`.
    pub fn new(request_id: RequestId, kind: LifecycleKind, at_ms: u64) -> Self {
        Self {
            request_id,
            kind,
            names: Vec::new(),
            count: 1,
            at_ms,
        }
    }

    /// Attaches the names involved.
    pub fn with_names(mut self, names: Vec<AuthorizationName>) -> Self {
        self.names = names;
        self
    }

    /// Sets how many requests this entry covers.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// The request this event belongs to.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// What happened.
    pub fn kind(&self) -> &LifecycleKind {
        &self.kind
    }

    /// Names involved, in request order.
    pub fn names(&self) -> &[AuthorizationName] {
        &self.names
    }

    /// Number of requests covered.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Monotonic time of the event.
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} request_id={}",
            self.at_ms, self.kind, self.request_id
        )?;
        if self.count != 1 {
            write!(f, " count={}", self.count)?;
        }
        if !self.names.is_empty() {
            let names: Vec<&str> = self.names.iter().map(AuthorizationName::as_str).collect();
            write!(f, " names={}", names.join(","))?;
        }
        Ok(())
    }
}

/// Ring buffer of recent lifecycle events.
///
/// # Example
///
/// ```
/// use grant_relay::{Journal, LifecycleEvent, LifecycleKind, RequestId};
///
/// let journal = Journal::new(2);
/// for at in 0..3 {
///     journal.record(LifecycleEvent::new(RequestId::generate(), LifecycleKind::Dispatched, at));
/// }
///
/// let events = journal.events();
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[0].at_ms(), 1);
/// ```
#[derive(Debug)]
pub struct Journal {
    capacity: usize,
    events: Mutex<VecDeque<LifecycleEvent>>,
}

impl Journal {
    /// Creates a journal retaining at most `capacity` events.
    ///
    /// A capacity of zero records nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends an event, dropping the oldest when full.
    pub fn record(&self, event: LifecycleEvent) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Returns a snapshot, oldest first.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Returns the events recorded for one request, oldest first.
    pub fn events_for(&self, request_id: &RequestId) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.request_id() == request_id)
            .cloned()
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Clears all retained events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_JOURNAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_starts_empty() {
        let journal = Journal::default();
        assert!(journal.is_empty());
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let journal = Journal::new(0);
        journal.record(LifecycleEvent::new(
            RequestId::generate(),
            LifecycleKind::Cancelled,
            0,
        ));
        assert!(journal.is_empty());
    }

    #[test]
    fn events_for_filters_by_identity() {
        let journal = Journal::new(8);
        let id = RequestId::generate();

        journal.record(LifecycleEvent::new(id, LifecycleKind::Dispatched, 1));
        journal.record(LifecycleEvent::new(
            RequestId::generate(),
            LifecycleKind::Dispatched,
            2,
        ));
        journal.record(LifecycleEvent::new(
            id,
            LifecycleKind::Resolved { denied: Vec::new() },
            3,
        ));

        let kinds: Vec<LifecycleKind> = journal
            .events_for(&id)
            .into_iter()
            .map(|event| event.kind().clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                LifecycleKind::Dispatched,
                LifecycleKind::Resolved { denied: Vec::new() }
            ]
        );
    }

    #[test]
    fn display_includes_names_and_count() {
        let event = LifecycleEvent::new(RequestId::noop(), LifecycleKind::Evicted, 42)
            .with_count(3)
            .with_names(vec!["a".into(), "b".into()]);

        assert_eq!(
            event.to_string(),
            "[42] evicted request_id=00000000-0000-0000-0000-000000000000 count=3 names=a,b"
        );
    }

    #[test]
    fn journal_can_be_cleared() {
        let journal = Journal::new(4);
        journal.record(LifecycleEvent::new(
            RequestId::generate(),
            LifecycleKind::Missed,
            0,
        ));
        journal.clear();
        assert!(journal.is_empty());
    }
}
