//! Matching asynchronous results back to pending requests.
//!
//! Results arrive on two channels: the standard prompt reports a batch of
//! per-name grants, and each specialized redirect reports on its own. Either
//! may carry the identity handed out at dispatch. Without one the oldest
//! pending request is assumed, which is only unambiguous while a single
//! request is in flight.
//!
//! A reported denial is never taken at face value. The platform may have
//! granted the authorization through another path, so every denial is
//! re-checked against the live grant state before it reaches the caller.

use crate::authorization::AuthorizationName;
use crate::config::SpecialCompletion;
use crate::engine::CorrelationEngine;
use crate::identity::RequestId;
use crate::journal::{LifecycleEvent, LifecycleKind};
use crate::pending::PendingRequest;
use crate::store::Settlement;

impl CorrelationEngine {
    /// Delivers a standard-channel result.
    ///
    /// Each `(name, granted)` pair reporting `false` is re-checked against
    /// the live grant state. Requested names missing from `results` are
    /// checked live as well. With `id` the matching request is resolved;
    /// without it the oldest pending request is. A miss is silently ignored.
    ///
    /// Under [`SpecialCompletion::AllResults`] the request stays pending
    /// until its specialized dispatches have also reported.
    pub fn resolve_batch<I>(&self, results: I, id: Option<&RequestId>)
    where
        I: IntoIterator<Item = (AuthorizationName, bool)>,
    {
        let reports: Vec<(AuthorizationName, bool)> = results
            .into_iter()
            .map(|(name, granted)| {
                let granted = granted || self.classifier.is_granted(&name);
                (name, granted)
            })
            .collect();

        let rule = self.config.special_completion;
        let mut target = None;
        let settlement = self.store.settle(id, |record| {
            target = Some(*record.id());
            record.record_standard(reports);
            rule == SpecialCompletion::FirstResult || record.awaiting().is_settled()
        });

        match settlement {
            Settlement::Completed(record) => {
                let denied = record.denied(self.classifier.as_ref());
                self.finish(record, denied);
            }
            Settlement::Pending => self.progressed(target),
            Settlement::Missed => self.missed(id, "batch"),
        }
    }

    /// Delivers a specialized-channel result for `name`.
    ///
    /// The outcome is read from the live grant state. Under
    /// [`SpecialCompletion::FirstResult`] the whole request resolves with
    /// `[name]` denied if it is still not granted, or nothing denied
    /// otherwise. Under [`SpecialCompletion::AllResults`] the request
    /// resolves once every outstanding result is in, and the denied set
    /// covers all of its names.
    pub fn resolve_single_special(&self, name: &AuthorizationName, id: Option<&RequestId>) {
        let granted = self.classifier.is_granted(name);
        let rule = self.config.special_completion;
        let mut target = None;
        let settlement = self.store.settle(id, |record| {
            target = Some(*record.id());
            record.record_special(name.clone(), granted);
            rule == SpecialCompletion::FirstResult || record.awaiting().is_settled()
        });

        match settlement {
            Settlement::Completed(record) => {
                let denied = match rule {
                    SpecialCompletion::FirstResult if granted => Vec::new(),
                    SpecialCompletion::FirstResult => vec![name.clone()],
                    SpecialCompletion::AllResults => record.denied(self.classifier.as_ref()),
                };
                self.finish(record, denied);
            }
            Settlement::Pending => self.progressed(target),
            Settlement::Missed => self.missed(id, "special"),
        }
    }

    fn finish(&self, record: PendingRequest, denied: Vec<AuthorizationName>) {
        let id = *record.id();
        tracing::debug!(request_id = %id, denied = denied.len(), "request resolved");
        self.record(
            LifecycleEvent::new(
                id,
                LifecycleKind::Resolved {
                    denied: denied.clone(),
                },
                self.now_ms(),
            )
            .with_names(record.requested().to_vec()),
        );
        record.complete(denied);
    }

    fn progressed(&self, target: Option<RequestId>) {
        let id = target.unwrap_or_else(RequestId::noop);
        tracing::debug!(request_id = %id, "partial result recorded");
        self.record(LifecycleEvent::new(id, LifecycleKind::Progressed, self.now_ms()));
    }

    fn missed(&self, id: Option<&RequestId>, channel: &'static str) {
        let id = id.copied().unwrap_or_else(RequestId::noop);
        tracing::warn!(request_id = %id, channel, "result matched no pending request");
        self.record(LifecycleEvent::new(id, LifecycleKind::Missed, self.now_ms()));
    }
}
