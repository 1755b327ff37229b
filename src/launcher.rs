//! Triggers for the out-of-band grant flows.

use parking_lot::Mutex;

use crate::authorization::AuthorizationName;
use crate::destination::Destination;
use crate::identity::RequestId;

/// Fire-and-forget triggers for the external grant flows.
///
/// Implementations start the flow and return immediately. The outcome is
/// reported later through
/// [`CorrelationEngine::resolve_batch`](crate::CorrelationEngine::resolve_batch)
/// or
/// [`CorrelationEngine::resolve_single_special`](crate::CorrelationEngine::resolve_single_special),
/// ideally carrying `request_id` back.
///
/// The record is stored before either trigger runs, so a launcher may report
/// the result synchronously from inside the call.
pub trait FlowLauncher: Send + Sync {
    /// Starts the shared prompt for every standard name of one request.
    fn launch_standard(&self, request_id: &RequestId, names: &[AuthorizationName]);

    /// Starts the external redirect for one specialized name.
    fn launch_special(
        &self,
        request_id: &RequestId,
        name: &AuthorizationName,
        destination: &Destination,
    );
}

/// A trigger captured by [`LaunchQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// A standard prompt for a batch of names.
    Standard {
        /// Request to report back against.
        request_id: RequestId,
        /// Names to prompt for, in request order.
        names: Vec<AuthorizationName>,
    },
    /// An external redirect for one name.
    Special {
        /// Request to report back against.
        request_id: RequestId,
        /// The specialized name.
        name: AuthorizationName,
        /// Where to send the user.
        destination: Destination,
    },
}

impl Launch {
    /// The request this launch belongs to.
    pub fn request_id(&self) -> &RequestId {
        match self {
            Launch::Standard { request_id, .. } | Launch::Special { request_id, .. } => request_id,
        }
    }
}

/// Launcher that queues triggers for a host to drain on its own thread.
///
/// Useful when the flows must be started from a specific thread (for
/// example a UI thread) while dispatch happens elsewhere.
///
/// # Examples
///
/// ```
/// use grant_relay::{AuthorizationName, FlowLauncher, Launch, LaunchQueue, RequestId};
///
/// let queue = LaunchQueue::new();
/// let id = RequestId::generate();
/// queue.launch_standard(&id, &[AuthorizationName::new("android.permission.CAMERA")]);
///
/// let launches = queue.drain();
/// assert_eq!(launches.len(), 1);
/// assert!(matches!(&launches[0], Launch::Standard { names, .. } if names.len() == 1));
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct LaunchQueue {
    launches: Mutex<Vec<Launch>>,
}

impl LaunchQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued launch, oldest first.
    pub fn drain(&self) -> Vec<Launch> {
        std::mem::take(&mut *self.launches.lock())
    }

    /// Returns a snapshot without draining.
    pub fn snapshot(&self) -> Vec<Launch> {
        self.launches.lock().clone()
    }

    /// Number of queued launches.
    pub fn len(&self) -> usize {
        self.launches.lock().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.launches.lock().is_empty()
    }
}

impl FlowLauncher for LaunchQueue {
    fn launch_standard(&self, request_id: &RequestId, names: &[AuthorizationName]) {
        self.launches.lock().push(Launch::Standard {
            request_id: *request_id,
            names: names.to_vec(),
        });
    }

    fn launch_special(
        &self,
        request_id: &RequestId,
        name: &AuthorizationName,
        destination: &Destination,
    ) {
        self.launches.lock().push(Launch::Special {
            request_id: *request_id,
            name: name.clone(),
            destination: destination.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_preserves_launch_order() {
        let queue = LaunchQueue::new();
        let id = RequestId::generate();
        let special = AuthorizationName::new("s");
        let destination = Destination::new("settings");

        queue.launch_special(&id, &special, &destination);
        queue.launch_standard(&id, &[AuthorizationName::from("a"), AuthorizationName::from("b")]);

        assert_eq!(
            queue.snapshot(),
            vec![
                Launch::Special {
                    request_id: id,
                    name: special,
                    destination,
                },
                Launch::Standard {
                    request_id: id,
                    names: vec!["a".into(), "b".into()],
                },
            ]
        );
        assert_eq!(queue.len(), 2);
        assert!(queue.drain().iter().all(|launch| launch.request_id() == &id));
        assert!(queue.is_empty());
    }
}
