//! `Lazy<T>`: explicit deferred resolution, and this port's stand-in for
//! Guice's `Provider<T>` injection point (§9 circular-proxy discussion:
//! breaking a cycle by injecting a `Lazy<T>` instead of a `T` directly).

use std::sync::Arc;

use crate::error::ProvisionError;

/// Wraps a provider closure so that construction happens on first [`Lazy::get`]
/// rather than when `Lazy<T>` itself is injected. Unlike a scope, this is a
/// property of the injection *site*, not of the binding: two different
/// injection points for the same key may use `Lazy<T>` and `Arc<T>` side by
/// side.
#[derive(Clone)]
pub struct Lazy<T: ?Sized> {
    factory: Arc<dyn Fn() -> Result<Arc<T>, ProvisionError> + Send + Sync>,
}

impl<T: ?Sized> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy").finish_non_exhaustive()
    }
}

impl<T: ?Sized> Lazy<T> {
    pub fn new(f: impl Fn() -> Result<Arc<T>, ProvisionError> + Send + Sync + 'static) -> Self {
        Self { factory: Arc::new(f) }
    }

    /// Resolves `T`, running the underlying binding's scope/listener
    /// pipeline exactly as a direct lookup would.
    pub fn get(&self) -> Result<Arc<T>, ProvisionError> {
        (self.factory)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn lazy_defers_until_get() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let lazy = Lazy::<u32>::new(move || {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(7))
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*lazy.get().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
