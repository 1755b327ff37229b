//! Authorization names and their delivery categories.
//!
//! An [`AuthorizationName`] is an opaque identifier for one requestable
//! capability. Most names are delivered through the standard in-process
//! prompt; a fixed set of them can only be granted by redirecting the user
//! to an external settings screen. That fixed set is modelled as the closed
//! enumeration [`SpecialAuthorization`] so that every consumer matching on it
//! is checked for exhaustiveness by the compiler.

use std::borrow::Borrow;
use std::fmt;

/// Well-known authorization names.
///
/// The specialized names double as the canonical spelling accepted by
/// [`SpecialAuthorization::from_name`].
pub mod names {
    /// Draw over other applications.
    pub const SYSTEM_ALERT_WINDOW: &str = "android.permission.SYSTEM_ALERT_WINDOW";
    /// Modify system settings.
    pub const WRITE_SETTINGS: &str = "android.permission.WRITE_SETTINGS";
    /// Read usage statistics.
    pub const PACKAGE_USAGE_STATS: &str = "android.permission.PACKAGE_USAGE_STATS";
    /// Access all files on shared storage.
    pub const MANAGE_EXTERNAL_STORAGE: &str = "android.permission.MANAGE_EXTERNAL_STORAGE";
    /// Run without battery optimizations.
    pub const REQUEST_IGNORE_BATTERY_OPTIMIZATIONS: &str =
        "android.permission.REQUEST_IGNORE_BATTERY_OPTIMIZATIONS";
    /// Schedule exact alarms.
    pub const SCHEDULE_EXACT_ALARM: &str = "android.permission.SCHEDULE_EXACT_ALARM";
    /// Bind an accessibility service.
    pub const BIND_ACCESSIBILITY_SERVICE: &str = "android.permission.BIND_ACCESSIBILITY_SERVICE";
    /// Bind a notification listener service.
    pub const BIND_NOTIFICATION_LISTENER_SERVICE: &str =
        "android.permission.BIND_NOTIFICATION_LISTENER_SERVICE";

    /// Post notifications.
    pub const POST_NOTIFICATIONS: &str = "android.permission.POST_NOTIFICATIONS";
    /// Write to shared external storage.
    pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";
    /// Read phone state.
    pub const READ_PHONE_STATE: &str = "android.permission.READ_PHONE_STATE";
    /// Read phone numbers.
    pub const READ_PHONE_NUMBERS: &str = "android.permission.READ_PHONE_NUMBERS";
}

/// Identifier naming one requestable capability.
///
/// Names are never generated by this crate; they are supplied by callers and
/// compared by exact string value.
///
/// # Examples
///
/// ```
/// use grant_relay::{AuthorizationName, DeliveryCategory, SpecialAuthorization};
///
/// let overlay = AuthorizationName::new("android.permission.SYSTEM_ALERT_WINDOW");
/// assert_eq!(
///     overlay.category(),
///     DeliveryCategory::Specialized(SpecialAuthorization::SystemAlertWindow)
/// );
///
/// let camera = AuthorizationName::from("android.permission.CAMERA");
/// assert_eq!(camera.category(), DeliveryCategory::Standard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorizationName(String);

impl AuthorizationName {
    /// Creates a name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the specialized kind this name refers to, if any.
    pub fn special(&self) -> Option<SpecialAuthorization> {
        SpecialAuthorization::from_name(&self.0)
    }

    /// Returns how a request for this name is delivered.
    pub fn category(&self) -> DeliveryCategory {
        match self.special() {
            Some(kind) => DeliveryCategory::Specialized(kind),
            None => DeliveryCategory::Standard,
        }
    }
}

impl fmt::Display for AuthorizationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorizationName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AuthorizationName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<SpecialAuthorization> for AuthorizationName {
    fn from(kind: SpecialAuthorization) -> Self {
        Self::new(kind.name())
    }
}

impl AsRef<str> for AuthorizationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AuthorizationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Delivery mechanism required for an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryCategory {
    /// Requested through the shared in-process prompt, batched per request.
    Standard,
    /// Requested by redirecting to an external authority, one dispatch per name.
    Specialized(SpecialAuthorization),
}

impl DeliveryCategory {
    /// Returns `true` for the specialized redirect category.
    pub fn is_specialized(self) -> bool {
        matches!(self, DeliveryCategory::Specialized(_))
    }
}

/// Authorizations whose grant flow is a full external redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialAuthorization {
    /// Draw over other applications.
    SystemAlertWindow,
    /// Modify system settings.
    WriteSettings,
    /// Read usage statistics.
    PackageUsageStats,
    /// Access all files on shared storage.
    ManageExternalStorage,
    /// Run without battery optimizations.
    RequestIgnoreBatteryOptimizations,
    /// Schedule exact alarms.
    ScheduleExactAlarm,
    /// Bind an accessibility service.
    BindAccessibilityService,
    /// Bind a notification listener service.
    BindNotificationListenerService,
}

impl SpecialAuthorization {
    /// Every specialized kind, in declaration order.
    pub const ALL: [SpecialAuthorization; 8] = [
        SpecialAuthorization::SystemAlertWindow,
        SpecialAuthorization::WriteSettings,
        SpecialAuthorization::PackageUsageStats,
        SpecialAuthorization::ManageExternalStorage,
        SpecialAuthorization::RequestIgnoreBatteryOptimizations,
        SpecialAuthorization::ScheduleExactAlarm,
        SpecialAuthorization::BindAccessibilityService,
        SpecialAuthorization::BindNotificationListenerService,
    ];

    /// Looks up the specialized kind for a canonical name.
    ///
    /// Returns `None` for every name outside the specialized set, which
    /// places it in the standard category.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Returns the canonical authorization name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            SpecialAuthorization::SystemAlertWindow => names::SYSTEM_ALERT_WINDOW,
            SpecialAuthorization::WriteSettings => names::WRITE_SETTINGS,
            SpecialAuthorization::PackageUsageStats => names::PACKAGE_USAGE_STATS,
            SpecialAuthorization::ManageExternalStorage => names::MANAGE_EXTERNAL_STORAGE,
            SpecialAuthorization::RequestIgnoreBatteryOptimizations => {
                names::REQUEST_IGNORE_BATTERY_OPTIMIZATIONS
            }
            SpecialAuthorization::ScheduleExactAlarm => names::SCHEDULE_EXACT_ALARM,
            SpecialAuthorization::BindAccessibilityService => names::BIND_ACCESSIBILITY_SERVICE,
            SpecialAuthorization::BindNotificationListenerService => {
                names::BIND_NOTIFICATION_LISTENER_SERVICE
            }
        }
    }
}

impl fmt::Display for SpecialAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
