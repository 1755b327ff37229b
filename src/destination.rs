//! External-authority destinations for specialized authorizations.

use std::fmt;

use crate::authorization::SpecialAuthorization;

/// Where to send the user to grant a specialized authorization.
///
/// The engine never interprets a destination; it hands it to the
/// [`FlowLauncher`](crate::FlowLauncher) unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    action: String,
    data: Option<String>,
}

impl Destination {
    /// Creates a destination without a data URI.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: None,
        }
    }

    /// Attaches a data URI.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Returns the action to invoke.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the data URI, if any.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{} ({})", self.action, data),
            None => f.write_str(&self.action),
        }
    }
}

/// Outcome of resolving a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The authorization can be requested at this destination.
    Destination(Destination),
    /// The platform cannot request this authorization; treat as denied.
    NotApplicable,
}

impl Resolution {
    /// Converts into an `Option`, discarding the not-applicable marker.
    pub fn into_destination(self) -> Option<Destination> {
        match self {
            Resolution::Destination(destination) => Some(destination),
            Resolution::NotApplicable => None,
        }
    }
}

/// Produces the external destination for a specialized authorization.
pub trait DestinationResolver: Send + Sync {
    /// Resolves the destination for `kind`, or reports it not applicable.
    fn resolve(&self, kind: SpecialAuthorization) -> Resolution;
}

/// Platform API level used for version gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion(pub u32);

impl PlatformVersion {
    /// First level with all-files access.
    pub const R: PlatformVersion = PlatformVersion(30);
    /// First level with the exact-alarm grant.
    pub const S: PlatformVersion = PlatformVersion(31);
}

/// Settings actions understood by the reference resolver.
pub mod actions {
    /// Overlay permission screen.
    pub const MANAGE_OVERLAY_PERMISSION: &str = "android.settings.action.MANAGE_OVERLAY_PERMISSION";
    /// Write-settings permission screen.
    pub const MANAGE_WRITE_SETTINGS: &str = "android.settings.action.MANAGE_WRITE_SETTINGS";
    /// Usage access list.
    pub const USAGE_ACCESS_SETTINGS: &str = "android.settings.USAGE_ACCESS_SETTINGS";
    /// All-files access screen for one package.
    pub const MANAGE_APP_ALL_FILES_ACCESS_PERMISSION: &str =
        "android.settings.MANAGE_APP_ALL_FILES_ACCESS_PERMISSION";
    /// Battery optimization exemption prompt.
    pub const REQUEST_IGNORE_BATTERY_OPTIMIZATIONS: &str =
        "android.settings.REQUEST_IGNORE_BATTERY_OPTIMIZATIONS";
    /// Exact alarm screen.
    pub const REQUEST_SCHEDULE_EXACT_ALARM: &str = "android.settings.REQUEST_SCHEDULE_EXACT_ALARM";
    /// Accessibility service list.
    pub const ACCESSIBILITY_SETTINGS: &str = "android.settings.ACCESSIBILITY_SETTINGS";
    /// Notification listener list.
    pub const NOTIFICATION_LISTENER_SETTINGS: &str =
        "android.settings.ACTION_NOTIFICATION_LISTENER_SETTINGS";
}

/// Reference resolver mapping each specialized kind to a settings screen.
///
/// Screens scoped to one application carry a `package:<name>` data URI.
/// All-files access requires [`PlatformVersion::R`] and exact alarms require
/// [`PlatformVersion::S`]; older platforms resolve those to
/// [`Resolution::NotApplicable`].
///
/// # Examples
///
/// ```
/// use grant_relay::{DestinationResolver, PlatformVersion, Resolution, SettingsDestinations, SpecialAuthorization};
///
/// let resolver = SettingsDestinations::new("com.example.app", PlatformVersion(29));
///
/// let overlay = resolver.resolve(SpecialAuthorization::SystemAlertWindow);
/// let destination = overlay.into_destination().expect("always applicable");
/// assert_eq!(destination.data(), Some("package:com.example.app"));
///
/// assert_eq!(
///     resolver.resolve(SpecialAuthorization::ManageExternalStorage),
///     Resolution::NotApplicable
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SettingsDestinations {
    package: String,
    version: PlatformVersion,
}

impl SettingsDestinations {
    /// Creates a resolver for `package` running on `version`.
    pub fn new(package: impl Into<String>, version: PlatformVersion) -> Self {
        Self {
            package: package.into(),
            version,
        }
    }

    fn scoped(&self, action: &str) -> Destination {
        Destination::new(action).with_data(format!("package:{}", self.package))
    }

    fn gated(&self, min: PlatformVersion, destination: Destination) -> Resolution {
        if self.version >= min {
            Resolution::Destination(destination)
        } else {
            Resolution::NotApplicable
        }
    }
}

impl DestinationResolver for SettingsDestinations {
    fn resolve(&self, kind: SpecialAuthorization) -> Resolution {
        use SpecialAuthorization::*;

        let destination = match kind {
            SystemAlertWindow => self.scoped(actions::MANAGE_OVERLAY_PERMISSION),
            WriteSettings => self.scoped(actions::MANAGE_WRITE_SETTINGS),
            PackageUsageStats => Destination::new(actions::USAGE_ACCESS_SETTINGS),
            ManageExternalStorage => {
                let destination = self.scoped(actions::MANAGE_APP_ALL_FILES_ACCESS_PERMISSION);
                return self.gated(PlatformVersion::R, destination);
            }
            RequestIgnoreBatteryOptimizations => {
                self.scoped(actions::REQUEST_IGNORE_BATTERY_OPTIMIZATIONS)
            }
            ScheduleExactAlarm => {
                let destination = Destination::new(actions::REQUEST_SCHEDULE_EXACT_ALARM);
                return self.gated(PlatformVersion::S, destination);
            }
            BindAccessibilityService => Destination::new(actions::ACCESSIBILITY_SETTINGS),
            BindNotificationListenerService => {
                Destination::new(actions::NOTIFICATION_LISTENER_SETTINGS)
            }
        };
        Resolution::Destination(destination)
    }
}
