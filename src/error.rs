use thiserror::Error;

use crate::identity::RequestId;

/// Errors raised by [`RequestStore`](crate::RequestStore).
///
/// None of these cross the correlation contract; the engine converts them
/// into a synchronous completion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// An identity was inserted twice. Identities are minted fresh, so this
    /// is an invariant violation rather than a caller error.
    #[error("request {id} is already pending")]
    DuplicateIdentity {
        /// The identity that collided.
        id: RequestId,
    },
}

/// Errors raised while validating [`CorrelationConfig`](crate::CorrelationConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero max age would evict every request on the next dispatch.
    #[error("max pending age must be greater than zero")]
    ZeroMaxAge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_identity_message_names_the_request() {
        let id = RequestId::noop();
        let err = StoreError::DuplicateIdentity { id };
        assert_eq!(
            err.to_string(),
            "request 00000000-0000-0000-0000-000000000000 is already pending"
        );
    }
}
