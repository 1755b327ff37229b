//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Age after which an unresolved request is considered abandoned.
pub const DEFAULT_MAX_PENDING_AGE: Duration = Duration::from_millis(300_000);

/// Default number of lifecycle events retained for diagnostics.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

/// When a request carrying specialized dispatches is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialCompletion {
    /// The first result on any channel resolves the whole request.
    ///
    /// A batch with several specialized names is resolved as soon as one of
    /// them reports back.
    #[default]
    FirstResult,
    /// The request resolves once every specialized dispatch has reported
    /// and the standard dispatch, if any, has reported.
    AllResults,
}

/// Tunables for [`CorrelationEngine`](crate::CorrelationEngine).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use grant_relay::{CorrelationConfig, SpecialCompletion};
///
/// let config = CorrelationConfig::default()
///     .with_max_pending_age(Duration::from_secs(60))
///     .with_special_completion(SpecialCompletion::AllResults);
///
/// assert!(config.validate().is_ok());
/// assert!(config.sweep_on_insert);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationConfig {
    /// Requests older than this are evicted without a callback.
    pub max_pending_age: Duration,
    /// Sweep stale requests before every insertion.
    pub sweep_on_insert: bool,
    /// Completion rule for requests with specialized dispatches.
    pub special_completion: SpecialCompletion,
    /// Lifecycle events retained; zero disables the journal.
    pub journal_capacity: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_pending_age: DEFAULT_MAX_PENDING_AGE,
            sweep_on_insert: true,
            special_completion: SpecialCompletion::default(),
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

impl CorrelationConfig {
    /// Sets the eviction threshold.
    pub fn with_max_pending_age(mut self, age: Duration) -> Self {
        self.max_pending_age = age;
        self
    }

    /// Enables or disables the opportunistic sweep on insertion.
    pub fn with_sweep_on_insert(mut self, enabled: bool) -> Self {
        self.sweep_on_insert = enabled;
        self
    }

    /// Sets the completion rule for specialized dispatches.
    pub fn with_special_completion(mut self, rule: SpecialCompletion) -> Self {
        self.special_completion = rule;
        self
    }

    /// Sets the journal capacity.
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    /// Checks the configuration for values the engine cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxAge`] if `max_pending_age` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pending_age.is_zero() {
            return Err(ConfigError::ZeroMaxAge);
        }
        Ok(())
    }
}
