//! Live grant-state queries.
//!
//! [`Classifier`] is the seam to the platform: the engine asks it whether a
//! name is currently granted and whether it belongs to the specialized
//! category. [`GrantTable`] is an in-memory implementation for hosts that
//! mirror grant state themselves, and for tests.

use dashmap::{DashMap, DashSet};

use crate::authorization::{names, AuthorizationName, SpecialAuthorization};

/// Platform predicate reporting the live grant state of authorizations.
///
/// Implementations must be cheap and non-blocking: the engine calls
/// `is_granted` while filtering a dispatch and again while matching each
/// result, because a result reported by the external flow may be stale.
///
/// Implementations must never panic on unknown names. A name the platform
/// cannot classify should be reported as granted.
pub trait Classifier: Send + Sync {
    /// Returns `true` if `name` is currently held.
    fn is_granted(&self, name: &AuthorizationName) -> bool;

    /// Returns the specialized kind `name` is delivered as, if any.
    ///
    /// The engine partitions and resolves destinations from this answer
    /// alone. Hosts with their own naming map names onto a kind here.
    fn special(&self, name: &AuthorizationName) -> Option<SpecialAuthorization> {
        name.special()
    }

    /// Returns `true` if `name` is delivered through an external redirect.
    fn is_specialized(&self, name: &AuthorizationName) -> bool {
        self.special(name).is_some()
    }

    /// Returns the names not currently granted, preserving input order.
    fn remaining(&self, names: &[AuthorizationName]) -> Vec<AuthorizationName> {
        names
            .iter()
            .filter(|name| !self.is_granted(name))
            .cloned()
            .collect()
    }

    /// Returns `true` if every name is currently granted.
    fn all_granted(&self, names: &[AuthorizationName]) -> bool {
        names.iter().all(|name| self.is_granted(name))
    }

    /// Runs `work` only when every name is currently granted.
    ///
    /// Returns whether `work` ran.
    fn all_granted_then<F>(&self, names: &[AuthorizationName], work: F) -> bool
    where
        Self: Sized,
        F: FnOnce(),
    {
        if self.all_granted(names) {
            work();
            true
        } else {
            false
        }
    }
}

/// How strongly the platform protects a standard authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionLevel {
    /// Granted implicitly; never prompts.
    Normal,
    /// Requires an explicit grant.
    Dangerous,
}

/// Thread-safe in-memory grant state.
///
/// Rules:
/// - specialized names are granted only after [`grant`](Self::grant);
/// - standard names are granted after `grant`, or implicitly when their
///   protection level is [`ProtectionLevel::Normal`];
/// - a standard name with no registered protection level is treated as
///   `Normal`.
///
/// [`POST_NOTIFICATIONS`](crate::names::POST_NOTIFICATIONS) is registered as
/// dangerous on construction.
///
/// # Examples
///
/// ```
/// use grant_relay::{AuthorizationName, Classifier, GrantTable, ProtectionLevel};
///
/// let table = GrantTable::new();
/// let camera = AuthorizationName::new("android.permission.CAMERA");
///
/// // Unknown protection level degrades to grantable.
/// assert!(table.is_granted(&camera));
///
/// table.set_protection(camera.clone(), ProtectionLevel::Dangerous);
/// assert!(!table.is_granted(&camera));
///
/// table.grant(camera.clone());
/// assert!(table.is_granted(&camera));
/// ```
#[derive(Debug)]
pub struct GrantTable {
    granted: DashSet<AuthorizationName>,
    protection: DashMap<AuthorizationName, ProtectionLevel>,
}

impl GrantTable {
    /// Creates a table with nothing granted.
    pub fn new() -> Self {
        let table = Self {
            granted: DashSet::new(),
            protection: DashMap::new(),
        };
        table.set_protection(names::POST_NOTIFICATIONS, ProtectionLevel::Dangerous);
        table
    }

    /// Marks `name` as granted.
    pub fn grant(&self, name: impl Into<AuthorizationName>) {
        self.granted.insert(name.into());
    }

    /// Withdraws an explicit grant. Returns whether one existed.
    pub fn revoke(&self, name: &AuthorizationName) -> bool {
        self.granted.remove(name).is_some()
    }

    /// Registers the protection level of a standard name.
    pub fn set_protection(&self, name: impl Into<AuthorizationName>, level: ProtectionLevel) {
        self.protection.insert(name.into(), level);
    }

    /// Returns the registered protection level, if any.
    pub fn protection(&self, name: &AuthorizationName) -> Option<ProtectionLevel> {
        self.protection.get(name).map(|level| *level)
    }
}

impl Default for GrantTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GrantTable {
    fn is_granted(&self, name: &AuthorizationName) -> bool {
        if self.granted.contains(name) {
            return true;
        }
        if self.is_specialized(name) {
            return false;
        }
        match self.protection(name) {
            Some(ProtectionLevel::Dangerous) => false,
            Some(ProtectionLevel::Normal) | None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dangerous(table: &GrantTable, name: &str) -> AuthorizationName {
        let name = AuthorizationName::new(name);
        table.set_protection(name.clone(), ProtectionLevel::Dangerous);
        name
    }

    #[test]
    fn specialized_names_start_denied() {
        let table = GrantTable::new();
        for kind in SpecialAuthorization::ALL {
            assert!(!table.is_granted(&kind.into()), "{kind} should start denied");
        }
    }

    #[test]
    fn specialized_names_ignore_protection_level() {
        let table = GrantTable::new();
        table.set_protection(names::WRITE_SETTINGS, ProtectionLevel::Normal);
        assert!(!table.is_granted(&AuthorizationName::new(names::WRITE_SETTINGS)));
    }

    #[test]
    fn post_notifications_is_dangerous_by_default() {
        let table = GrantTable::new();
        let name = AuthorizationName::new(names::POST_NOTIFICATIONS);
        assert_eq!(table.protection(&name), Some(ProtectionLevel::Dangerous));
        assert!(!table.is_granted(&name));
    }

    #[test]
    fn grant_and_revoke() {
        let table = GrantTable::new();
        let name = dangerous(&table, "android.permission.READ_CONTACTS");

        table.grant(name.clone());
        assert!(table.is_granted(&name));

        assert!(table.revoke(&name));
        assert!(!table.is_granted(&name));
        assert!(!table.revoke(&name), "second revoke is a no-op");
    }

    #[test]
    fn remaining_preserves_order() {
        let table = GrantTable::new();
        let a = dangerous(&table, "a");
        let b = dangerous(&table, "b");
        let c = dangerous(&table, "c");
        table.grant(b.clone());

        let remaining = table.remaining(&[c.clone(), b, a.clone()]);
        assert_eq!(remaining, vec![c, a]);
    }

    #[test]
    fn all_granted_then_runs_work_only_when_granted() {
        let table = GrantTable::new();
        let name = dangerous(&table, "x");
        let mut ran = false;

        assert!(!table.all_granted_then(std::slice::from_ref(&name), || ran = true));
        assert!(!ran);

        table.grant(name.clone());
        assert!(table.all_granted_then(&[name], || ran = true));
        assert!(ran);
    }

    #[test]
    fn empty_set_is_all_granted() {
        let table = GrantTable::new();
        assert!(table.all_granted(&[]));
        assert!(table.remaining(&[]).is_empty());
    }
}
