use std::sync::Arc;

/// Client-side query cache that depends on the signed-in identity.
///
/// Both calls are fire-and-forget; the session does not wait on refetches.
pub trait QueryCache: Send + Sync + 'static {
    /// Mark every cached query stale so it refetches under the new identity.
    fn invalidate_all(&self);

    /// Drop every cached query and its data.
    fn clear_all(&self);
}

impl<T: QueryCache> QueryCache for Arc<T> {
    fn invalidate_all(&self) {
        (**self).invalidate_all();
    }

    fn clear_all(&self) {
        (**self).clear_all();
    }
}

/// `QueryCache` for hosts that do not cache identity-scoped data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl QueryCache for NoopCache {
    fn invalidate_all(&self) {}

    fn clear_all(&self) {}
}
