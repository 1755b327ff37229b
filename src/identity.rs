use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Opaque correlation token minted once per dispatch.
///
/// Identities are random 128-bit values and are never reused. The nil value
/// is reserved as the no-op identity returned when a request completed
/// synchronously and nothing was stored; cancelling or resolving it is a
/// harmless miss.
///
/// # Examples
///
/// ```
/// use grant_relay::RequestId;
///
/// let id = RequestId::generate();
/// assert!(!id.is_noop());
///
/// let parsed: RequestId = id.to_string().parse().unwrap();
/// assert_eq!(parsed, id);
///
/// assert!(RequestId::noop().is_noop());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mints a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the reserved no-op identity.
    pub const fn noop() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` for the reserved no-op identity.
    pub fn is_noop(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
