use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Application lifecycle state reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

impl AppState {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Remembers the last reported state to detect returns to the foreground.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AppStateTracker {
    current: AppState,
}

impl AppStateTracker {
    pub(crate) fn new(initial: AppState) -> Self {
        Self { current: initial }
    }

    /// Records `next`. Returns `true` on an inactive/background → active transition.
    pub(crate) fn transition(&mut self, next: AppState) -> bool {
        let resumed = !self.current.is_active() && next.is_active();
        self.current = next;
        resumed
    }
}

/// Handle to a running lifecycle listener.
///
/// The listener stops when the handle is dropped or
/// [`unsubscribe`](LifecycleSubscription::unsubscribe) is called.
#[derive(Debug)]
#[must_use = "dropping the subscription stops the lifecycle listener"]
pub struct LifecycleSubscription {
    handle: JoinHandle<()>,
}

impl LifecycleSubscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    /// `true` once the listener has exited (channel closed or aborted).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
