//! Correlation of out-of-band authorization requests with their results.
//!
//! Some authorizations are granted by an external authority the caller does
//! not control: a system prompt, or a settings screen the user is sent to.
//! The outcome comes back later on a side channel that may not say which
//! request it answers. This crate keeps track of those requests:
//!
//! - **Dispatch**: filter out names already granted, split the rest into
//!   standard and specialized deliveries, launch them, and hand back an
//!   opaque [`RequestId`].
//! - **Matching**: route each result to its pending request by identity, or
//!   to the oldest one when no identity is available, re-check denials
//!   against live grant state and run the completion callback exactly once.
//! - **Cleanup**: cancellation and age-based eviction drop requests without
//!   running their callbacks.
//!
//! # Core Types
//!
//! - [`CorrelationEngine`]: dispatch, matching, cancellation and eviction
//! - [`RequestStore`]: concurrent identity-keyed store of [`PendingRequest`]s
//! - [`Classifier`]: live grant predicate supplied by the platform
//! - [`DestinationResolver`]: external destination for a [`SpecialAuthorization`]
//! - [`FlowLauncher`]: fire-and-forget triggers for the external flows
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use grant_relay::{
//!     names, AuthorizationName, CorrelationEngine, GrantTable, LaunchQueue, PlatformVersion,
//!     SettingsDestinations,
//! };
//!
//! let grants = Arc::new(GrantTable::new());
//! let launches = Arc::new(LaunchQueue::new());
//! let engine = CorrelationEngine::builder(
//!     grants.clone(),
//!     Arc::new(SettingsDestinations::new("com.example", PlatformVersion(34))),
//!     launches.clone(),
//! )
//! .build()
//! .expect("default configuration is valid");
//!
//! let overlay = AuthorizationName::new(names::SYSTEM_ALERT_WINDOW);
//! let granted = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&granted);
//! let id = engine.request_single_special(&overlay, move |ok| flag.store(ok, Ordering::SeqCst));
//!
//! // The host opens the settings screen, the user flips the switch...
//! assert_eq!(launches.drain().len(), 1);
//! grants.grant(overlay.clone());
//!
//! // ...and reports back when the screen closes.
//! engine.resolve_single_special(&overlay, Some(&id));
//! assert!(granted.load(Ordering::SeqCst));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authorization;
mod classifier;
mod clock;
mod config;
mod destination;
mod engine;
mod error;
mod identity;
mod journal;
mod launcher;
mod matcher;
mod pending;
mod store;

pub use authorization::{names, AuthorizationName, DeliveryCategory, SpecialAuthorization};
pub use classifier::{Classifier, GrantTable, ProtectionLevel};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{
    CorrelationConfig, SpecialCompletion, DEFAULT_JOURNAL_CAPACITY, DEFAULT_MAX_PENDING_AGE,
};
pub use destination::{
    actions, Destination, DestinationResolver, PlatformVersion, Resolution, SettingsDestinations,
};
pub use engine::{CorrelationEngine, EngineBuilder};
pub use error::{ConfigError, StoreError};
pub use identity::RequestId;
pub use journal::{Journal, LifecycleEvent, LifecycleKind};
pub use launcher::{FlowLauncher, Launch, LaunchQueue};
pub use pending::{Awaiting, Completion, PendingRequest};
pub use store::{InsertRejected, RequestStore, Settlement};
