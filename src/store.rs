//! Concurrent mapping from request identity to pending request.
//!
//! Every removal goes through a single atomic map operation, so when a
//! resolver, a cancellation and an eviction sweep race for the same
//! identity exactly one of them receives the record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::identity::RequestId;
use crate::pending::PendingRequest;

/// A record the store refused, handed back so its callback is not lost.
#[derive(Debug)]
pub struct InsertRejected {
    /// Why the record was refused.
    pub error: StoreError,
    /// The record, untouched.
    pub record: PendingRequest,
}

/// Result of reporting an outcome against a pending request.
#[derive(Debug)]
pub enum Settlement {
    /// The report finished the request; the record was removed.
    Completed(PendingRequest),
    /// The report was recorded but other results are still outstanding.
    Pending,
    /// No matching record: already resolved, cancelled or evicted.
    Missed,
}

/// Thread-safe store of pending requests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use grant_relay::{Awaiting, Completion, ManualClock, PendingRequest, RequestId, RequestStore};
///
/// let store = RequestStore::new(Arc::new(ManualClock::new(0)));
/// let id = RequestId::generate();
/// let record = PendingRequest::new(
///     id,
///     vec!["android.permission.CAMERA".into()],
///     Awaiting { standard: true, special: 0 },
///     Completion::new(|_| {}),
/// );
///
/// store.insert(record).unwrap();
/// assert_eq!(store.len(), 1);
///
/// assert!(store.remove_by_id(&id).is_some());
/// assert!(store.remove_by_id(&id).is_none());
/// ```
#[derive(Debug)]
pub struct RequestStore {
    records: DashMap<RequestId, PendingRequest>,
    clock: Arc<dyn Clock>,
    next_seq: AtomicU64,
}

impl RequestStore {
    /// Creates an empty store aging records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Inserts a record, stamping its creation time and insertion order.
    ///
    /// # Errors
    ///
    /// Returns the record inside [`InsertRejected`] if its identity is
    /// already present.
    pub fn insert(&self, mut record: PendingRequest) -> Result<(), InsertRejected> {
        let id = *record.id();
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(InsertRejected {
                error: StoreError::DuplicateIdentity { id },
                record,
            }),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                record.stamp(self.clock.now_ms(), seq);
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Removes and returns the record for `id`. Idempotent.
    pub fn remove_by_id(&self, id: &RequestId) -> Option<PendingRequest> {
        self.records.remove(id).map(|(_, record)| record)
    }

    /// Removes and returns the oldest record.
    ///
    /// Ties on creation time go to the record inserted first.
    pub fn remove_oldest(&self) -> Option<PendingRequest> {
        loop {
            let oldest = self.oldest_id()?;
            // Lost a race for this key; look again.
            if let Some((_, record)) = self.records.remove(&oldest) {
                return Some(record);
            }
        }
    }

    /// Removes every record older than `max_age` without running callbacks.
    ///
    /// Returns the number of records removed.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = self.clock.now_ms();
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        let expired = |record: &PendingRequest| now.saturating_sub(record.created_at_ms()) > max_age_ms;

        let stale: Vec<RequestId> = self
            .records
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| *entry.key())
            .collect();

        // Removed records outlive the shard locks; their callbacks may re-enter.
        let evicted: Vec<PendingRequest> = stale
            .iter()
            .filter_map(|id| self.records.remove_if(id, |_, record| expired(record)))
            .map(|(_, record)| record)
            .collect();

        for record in &evicted {
            let age = now.saturating_sub(record.created_at_ms());
            tracing::warn!(request_id = %record.id(), age_ms = age, "evicting abandoned request");
        }
        evicted.len()
    }

    /// Applies `report` to a pending request and removes it if finished.
    ///
    /// With an identity the matching record is targeted. Without one the
    /// oldest record is used; which record that is becomes ambiguous when
    /// several are pending.
    ///
    /// `report` mutates the record under the store's lock and returns
    /// whether the request is finished. It runs at most once.
    pub fn settle<F>(&self, id: Option<&RequestId>, report: F) -> Settlement
    where
        F: FnOnce(&mut PendingRequest) -> bool,
    {
        match id {
            Some(id) => self.settle_id(id, report).unwrap_or(Settlement::Missed),
            None => {
                let mut report = report;
                loop {
                    let Some(oldest) = self.oldest_id() else {
                        return Settlement::Missed;
                    };
                    match self.settle_id(&oldest, report) {
                        Ok(settlement) => return settlement,
                        Err(unused) => report = unused,
                    }
                }
            }
        }
    }

    /// Returns `Err(report)` untouched when `id` is absent.
    fn settle_id<F>(&self, id: &RequestId, report: F) -> Result<Settlement, F>
    where
        F: FnOnce(&mut PendingRequest) -> bool,
    {
        let mut report = Some(report);
        let removed = self.records.remove_if_mut(id, |_, record| match report.take() {
            Some(report) => report(record),
            None => false,
        });

        match (removed, report) {
            (Some((_, record)), _) => Ok(Settlement::Completed(record)),
            (None, Some(report)) => Err(report),
            (None, None) => Ok(Settlement::Pending),
        }
    }

    fn oldest_id(&self) -> Option<RequestId> {
        self.records
            .iter()
            .min_by_key(|entry| (entry.created_at_ms(), entry.seq()))
            .map(|entry| *entry.key())
    }

    /// Returns `true` if `id` is pending.
    pub fn contains(&self, id: &RequestId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
