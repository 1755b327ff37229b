//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;

use grant_relay::{
    AuthorizationName, CorrelationConfig, CorrelationEngine, GrantTable, LaunchQueue, ManualClock,
    PlatformVersion, ProtectionLevel, SettingsDestinations,
};
use parking_lot::Mutex;

pub const STD1: &str = "STD1";
pub const STD2: &str = "STD2";
pub const STD3: &str = "STD3";

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn name(raw: &str) -> AuthorizationName {
    AuthorizationName::new(raw)
}

pub struct Harness {
    pub grants: Arc<GrantTable>,
    pub launches: Arc<LaunchQueue>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<CorrelationEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(PlatformVersion(34), CorrelationConfig::default())
    }

    pub fn with(version: PlatformVersion, config: CorrelationConfig) -> Self {
        init_tracing();

        let grants = Arc::new(GrantTable::new());
        for raw in [STD1, STD2, STD3] {
            grants.set_protection(raw, ProtectionLevel::Dangerous);
        }
        let launches = Arc::new(LaunchQueue::new());
        let clock = Arc::new(ManualClock::new(0));
        let engine = CorrelationEngine::builder(
            grants.clone(),
            Arc::new(SettingsDestinations::new("com.example.app", version)),
            launches.clone(),
        )
        .clock(clock.clone())
        .config(config)
        .build()
        .expect("valid config");

        Self {
            grants,
            launches,
            clock,
            engine: Arc::new(engine),
        }
    }
}

/// Collects every denied list delivered to its callbacks.
#[derive(Clone, Default)]
pub struct Outcomes {
    calls: Arc<Mutex<Vec<Vec<AuthorizationName>>>>,
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl FnOnce(Vec<AuthorizationName>) + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move |denied: Vec<AuthorizationName>| calls.lock().push(denied)
    }

    pub fn calls(&self) -> Vec<Vec<AuthorizationName>> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }
}
