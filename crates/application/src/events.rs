//! Shared error-signal channels

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Process-wide broadcast channels for classified request failures.
///
/// One instance is constructed at startup and shared by reference into
/// every dispatcher; tests construct a fresh instance per run instead of
/// reaching for a global. Publishing with no subscribers is a no-op.
#[derive(Debug)]
pub struct ApiEvents {
    errors: broadcast::Sender<String>,
    unauthorized: broadcast::Sender<()>,
}

impl ApiEvents {
    /// Creates a fresh pair of channels.
    #[must_use]
    pub fn new() -> Self {
        let (errors, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (unauthorized, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            errors,
            unauthorized,
        }
    }

    /// Subscribes to classified error messages from non-401 failures.
    #[must_use]
    pub fn subscribe_errors(&self) -> broadcast::Receiver<String> {
        self.errors.subscribe()
    }

    /// Subscribes to the unauthorized signal emitted on 401 failures.
    #[must_use]
    pub fn subscribe_unauthorized(&self) -> broadcast::Receiver<()> {
        self.unauthorized.subscribe()
    }

    pub(crate) fn publish_error(&self, message: String) {
        let _ = self.errors.send(message);
    }

    pub(crate) fn publish_unauthorized(&self) {
        let _ = self.unauthorized.send(());
    }
}

impl Default for ApiEvents {
    fn default() -> Self {
        Self::new()
    }
}
