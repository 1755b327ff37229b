use std::fmt;
use std::sync::Arc;

use crate::authorization::{AuthorizationName, SpecialAuthorization};
use crate::classifier::Classifier;
use crate::clock::{Clock, MonotonicClock};
use crate::config::CorrelationConfig;
use crate::destination::{Destination, DestinationResolver};
use crate::error::ConfigError;
use crate::identity::RequestId;
use crate::journal::{Journal, LifecycleEvent, LifecycleKind};
use crate::launcher::FlowLauncher;
use crate::pending::{Awaiting, Completion, PendingRequest};
use crate::store::{InsertRejected, RequestStore};

/// Correlates authorization requests with their out-of-band results.
///
/// One engine is built at application start and shared (typically behind an
/// `Arc`) with every call site that dispatches requests and every callback
/// path that delivers results. All methods take `&self`, never block, and
/// never return errors: every failure degrades to a denial delivered through
/// the completion callback.
///
/// # Lifecycle
///
/// ```text
/// request ──► filter granted ──► partition ──► store ──► launch
///                 │ nothing left                     │
///                 ▼                                  ▼
///          callback([]) now           resolve_* ─► callback(denied)
///                                     cancel    ─► dropped silently
///                                     sweep     ─► dropped silently
/// ```
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use grant_relay::{
///     AuthorizationName, CorrelationEngine, GrantTable, LaunchQueue, PlatformVersion,
///     ProtectionLevel, SettingsDestinations,
/// };
///
/// let grants = Arc::new(GrantTable::new());
/// let camera = AuthorizationName::new("android.permission.CAMERA");
/// grants.set_protection(camera.clone(), ProtectionLevel::Dangerous);
///
/// let launches = Arc::new(LaunchQueue::new());
/// let engine = CorrelationEngine::builder(
///     grants.clone(),
///     Arc::new(SettingsDestinations::new("com.example", PlatformVersion(34))),
///     launches.clone(),
/// )
/// .build()
/// .unwrap();
///
/// let denied = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&denied);
/// let id = engine.request(&[camera.clone()], move |names| {
///     *sink.lock().unwrap() = Some(names);
/// });
/// assert_eq!(engine.pending_count(), 1);
/// assert_eq!(launches.len(), 1);
///
/// // The prompt reports a denial, but the user granted it meanwhile.
/// grants.grant(camera.clone());
/// engine.resolve_batch([(camera, false)], Some(&id));
///
/// assert_eq!(*denied.lock().unwrap(), Some(Vec::new()));
/// assert_eq!(engine.pending_count(), 0);
/// ```
pub struct CorrelationEngine {
    pub(crate) store: RequestStore,
    pub(crate) classifier: Arc<dyn Classifier>,
    resolver: Arc<dyn DestinationResolver>,
    launcher: Arc<dyn FlowLauncher>,
    clock: Arc<dyn Clock>,
    pub(crate) config: CorrelationConfig,
    journal: Journal,
}

/// Builder for [`CorrelationEngine`].
pub struct EngineBuilder {
    classifier: Arc<dyn Classifier>,
    resolver: Arc<dyn DestinationResolver>,
    launcher: Arc<dyn FlowLauncher>,
    clock: Option<Arc<dyn Clock>>,
    config: CorrelationConfig,
}

impl EngineBuilder {
    /// Replaces the default configuration.
    pub fn config(mut self, config: CorrelationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default [`MonotonicClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the configuration and builds the engine.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn build(self) -> Result<CorrelationEngine, ConfigError> {
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        Ok(CorrelationEngine {
            store: RequestStore::new(Arc::clone(&clock)),
            classifier: self.classifier,
            resolver: self.resolver,
            launcher: self.launcher,
            clock,
            journal: Journal::new(self.config.journal_capacity),
            config: self.config,
        })
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl CorrelationEngine {
    /// Starts building an engine from its collaborators.
    pub fn builder(
        classifier: Arc<dyn Classifier>,
        resolver: Arc<dyn DestinationResolver>,
        launcher: Arc<dyn FlowLauncher>,
    ) -> EngineBuilder {
        EngineBuilder {
            classifier,
            resolver,
            launcher,
            clock: None,
            config: CorrelationConfig::default(),
        }
    }

    /// Requests `names` through the engine's configured launcher.
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn request<F>(&self, names: &[AuthorizationName], on_complete: F) -> RequestId
    where
        F: FnOnce(Vec<AuthorizationName>) + Send + 'static,
    {
        self.dispatch(names, self.launcher.as_ref(), on_complete)
    }

    /// Requests `names`, triggering flows through `launcher`.
    ///
    /// Names already granted are dropped. If none remain, `on_complete` runs
    /// immediately with an empty list and the no-op identity is returned.
    /// Otherwise the remaining names are split into specialized names, each
    /// launched on its own, and standard names, launched together once.
    /// Specialized names the platform cannot request are not launched.
    ///
    /// If nothing at all could be launched, `on_complete` runs immediately
    /// with the remaining names that are still not granted.
    ///
    /// The record is stored before any launch, so results reported from
    /// inside the launcher are matched.
    pub fn dispatch<F>(
        &self,
        names: &[AuthorizationName],
        launcher: &dyn FlowLauncher,
        on_complete: F,
    ) -> RequestId
    where
        F: FnOnce(Vec<AuthorizationName>) + Send + 'static,
    {
        let remaining = self.classifier.remaining(names);
        if remaining.is_empty() {
            tracing::debug!(requested = names.len(), "all authorizations already granted");
            self.short_circuit(Vec::new());
            on_complete(Vec::new());
            return RequestId::noop();
        }

        let mut standard = Vec::new();
        let mut launches: Vec<(AuthorizationName, Destination)> = Vec::new();
        for name in &remaining {
            let Some(kind) = self.classifier.special(name) else {
                standard.push(name.clone());
                continue;
            };
            match self.destination_for(kind) {
                Some(destination) => launches.push((name.clone(), destination)),
                None => {
                    tracing::debug!(name = %name, "authorization not applicable on this platform");
                }
            }
        }

        if launches.is_empty() && standard.is_empty() {
            let denied = self.classifier.remaining(&remaining);
            self.short_circuit(denied.clone());
            on_complete(denied);
            return RequestId::noop();
        }

        let id = RequestId::generate();
        let awaiting = Awaiting {
            standard: !standard.is_empty(),
            special: launches.len(),
        };
        let record = PendingRequest::new(id, remaining, awaiting, Completion::new(on_complete));
        if !self.store_pending(record) {
            return RequestId::noop();
        }

        for (name, destination) in &launches {
            tracing::debug!(request_id = %id, name = %name, destination = %destination, "launching specialized flow");
            launcher.launch_special(&id, name, destination);
        }
        if !standard.is_empty() {
            tracing::debug!(request_id = %id, count = standard.len(), "launching standard flow");
            launcher.launch_standard(&id, &standard);
        }
        id
    }

    /// Requests one specialized authorization through the configured launcher.
    ///
    /// See [`dispatch_single_special`](Self::dispatch_single_special).
    pub fn request_single_special<F>(&self, name: &AuthorizationName, on_granted: F) -> RequestId
    where
        F: FnOnce(bool) + Send + 'static,
    {
        self.dispatch_single_special(
            name,
            |id, destination| self.launcher.launch_special(id, name, destination),
            on_granted,
        )
    }

    /// Requests one specialized authorization, starting it with `trigger`.
    ///
    /// If `name` is not specialized, or the platform cannot request it,
    /// `on_granted(false)` runs immediately and the no-op identity is
    /// returned. Otherwise `on_granted` runs once the result arrives, with
    /// `true` only if nothing was denied.
    pub fn dispatch_single_special<T, F>(
        &self,
        name: &AuthorizationName,
        trigger: T,
        on_granted: F,
    ) -> RequestId
    where
        T: FnOnce(&RequestId, &Destination),
        F: FnOnce(bool) + Send + 'static,
    {
        let destination = match self.classifier.special(name) {
            Some(kind) => self.destination_for(kind),
            None => {
                tracing::debug!(name = %name, "not a specialized authorization");
                None
            }
        };
        let Some(destination) = destination else {
            self.short_circuit(vec![name.clone()]);
            on_granted(false);
            return RequestId::noop();
        };

        let id = RequestId::generate();
        let awaiting = Awaiting {
            standard: false,
            special: 1,
        };
        let completion = Completion::new(move |denied: Vec<AuthorizationName>| {
            on_granted(denied.is_empty());
        });
        let record = PendingRequest::new(id, vec![name.clone()], awaiting, completion);
        if !self.store_pending(record) {
            return RequestId::noop();
        }

        tracing::debug!(request_id = %id, name = %name, destination = %destination, "launching specialized flow");
        trigger(&id, &destination);
        id
    }

    /// Drops a pending request without running its callback.
    ///
    /// Unknown, already resolved and no-op identities are ignored.
    pub fn cancel(&self, id: &RequestId) {
        match self.store.remove_by_id(id) {
            Some(record) => {
                tracing::info!(request_id = %id, "request cancelled");
                self.record(
                    LifecycleEvent::new(*id, LifecycleKind::Cancelled, self.clock.now_ms())
                        .with_names(record.requested().to_vec()),
                );
            }
            None => tracing::debug!(request_id = %id, "cancel found no pending request"),
        }
    }

    /// Evicts every request older than the configured max age.
    ///
    /// Runs automatically before each insertion unless disabled; hosts may
    /// also call it from a timer. Evicted callbacks never run.
    pub fn sweep(&self) -> usize {
        let evicted = self.store.evict_older_than(self.config.max_pending_age);
        if evicted > 0 {
            self.record(
                LifecycleEvent::new(RequestId::noop(), LifecycleKind::Evicted, self.clock.now_ms())
                    .with_count(evicted),
            );
        }
        evicted
    }

    /// Number of requests awaiting a result.
    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if `id` is awaiting a result.
    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.store.contains(id)
    }

    /// Recent lifecycle events.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Active configuration.
    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    fn destination_for(&self, kind: SpecialAuthorization) -> Option<Destination> {
        self.resolver.resolve(kind).into_destination()
    }

    fn short_circuit(&self, denied: Vec<AuthorizationName>) {
        self.record(LifecycleEvent::new(
            RequestId::noop(),
            LifecycleKind::ShortCircuited { denied },
            self.clock.now_ms(),
        ));
    }

    /// Stores `record`, sweeping first. On rejection the record completes
    /// immediately and `false` is returned.
    fn store_pending(&self, record: PendingRequest) -> bool {
        if self.config.sweep_on_insert {
            self.sweep();
        }

        let id = *record.id();
        let names = record.requested().to_vec();
        match self.store.insert(record) {
            Ok(()) => {
                tracing::debug!(request_id = %id, count = names.len(), "request pending");
                self.record(
                    LifecycleEvent::new(id, LifecycleKind::Dispatched, self.clock.now_ms())
                        .with_names(names),
                );
                true
            }
            Err(InsertRejected { error, record }) => {
                tracing::error!(request_id = %id, %error, "pending request rejected");
                let denied = self.classifier.remaining(record.requested());
                self.record(
                    LifecycleEvent::new(id, LifecycleKind::Failed, self.clock.now_ms())
                        .with_names(names),
                );
                record.complete(denied);
                false
            }
        }
    }

    pub(crate) fn record(&self, event: LifecycleEvent) {
        self.journal.record(event);
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("pending", &self.store.len())
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
