//! Live, observable view of one cache key
//!
//! A [`Binding`] is what a consumer holds after [`Swr::acquire`](super::Swr::acquire).
//! It exposes four observable cells (`data`, `error`, `is_validating`,
//! `is_loading`), a manual [`mutate`](Binding::mutate) entry point and an
//! idempotent [`dispose`](Binding::dispose) that unregisters its triggers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::engine::Revalidator;
use super::triggers::{TriggerHandle, TriggerKind};

/// Observable state owned by a single binding
pub(crate) struct Cells<T, E> {
    pub(crate) data: watch::Sender<Option<Arc<T>>>,
    pub(crate) error: watch::Sender<Option<Arc<E>>>,
    pub(crate) is_validating: watch::Sender<bool>,
    pub(crate) is_loading: watch::Sender<bool>,
    disposed: AtomicBool,
    /// Serialises revalidations issued through this binding
    pub(crate) fetch_gate: tokio::sync::Mutex<()>,
}

impl<T, E> Cells<T, E> {
    pub(crate) fn new(data: Option<Arc<T>>, is_loading: bool) -> Self {
        Self {
            data: watch::Sender::new(data),
            error: watch::Sender::new(None),
            is_validating: watch::Sender::new(false),
            is_loading: watch::Sender::new(is_loading),
            disposed: AtomicBool::new(false),
            fetch_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Marks the cells dead; returns false if they already were
    fn mark_disposed(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }
}

/// A consumer's handle on one cache key
///
/// Bindings for the same key share the cached value but each owns its own
/// cells and trigger registrations. A binding is never torn down implicitly:
/// call [`dispose`](Binding::dispose) to stop its triggers.
pub struct Binding<T, E> {
    revalidator: Revalidator<T, E>,
    triggers: Mutex<Vec<TriggerHandle>>,
}

impl<T, E> Binding<T, E>
where
    T: Send + Sync + 'static,
    E: std::fmt::Display + Send + Sync + 'static,
{
    pub(crate) fn new(revalidator: Revalidator<T, E>, triggers: Vec<TriggerHandle>) -> Self {
        Self {
            revalidator,
            triggers: Mutex::new(triggers),
        }
    }

    /// The cache key this binding observes
    pub fn key(&self) -> &str {
        self.revalidator.key()
    }

    /// Latest value, from the cache, `initial_data`, or the last successful fetch
    pub fn data(&self) -> Option<Arc<T>> {
        self.cells().data.borrow().clone()
    }

    /// Failure of the most recent fetch, cleared by the next success
    pub fn error(&self) -> Option<Arc<E>> {
        self.cells().error.borrow().clone()
    }

    /// True while this binding has a fetch in flight
    pub fn is_validating(&self) -> bool {
        *self.cells().is_validating.borrow()
    }

    /// True until the first fetch for this key has completed
    pub fn is_loading(&self) -> bool {
        *self.cells().is_loading.borrow()
    }

    pub fn subscribe_data(&self) -> watch::Receiver<Option<Arc<T>>> {
        self.cells().data.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<Arc<E>>> {
        self.cells().error.subscribe()
    }

    pub fn subscribe_validating(&self) -> watch::Receiver<bool> {
        self.cells().is_validating.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.cells().is_loading.subscribe()
    }

    /// Requests a revalidation and waits for it to finish
    ///
    /// Subject to the deduping interval; never returns the fetch error, which
    /// lands in the `error` cell instead.
    pub async fn mutate(&self) {
        self.revalidator.revalidate().await;
    }

    /// Waits until the first fetch has completed and nothing is in flight
    ///
    /// A deduped revalidation also completes loading once the key has a
    /// cached value. Never resolves for a binding disposed while a fetch was
    /// pending.
    pub async fn settled(&self) {
        let mut loading = self.subscribe_loading();
        let mut validating = self.subscribe_validating();
        loop {
            // Both senders live as long as `self`, so these cannot fail.
            let _ = loading.wait_for(|is_loading| !*is_loading).await;
            let _ = validating.wait_for(|is_validating| !*is_validating).await;
            if !self.is_loading() && !self.is_validating() {
                return;
            }
        }
    }

    /// Unregisters every trigger this binding registered
    ///
    /// Safe to call more than once; later calls do nothing. A fetch already
    /// in flight is not aborted, but its outcome is no longer written to
    /// this binding's cells.
    pub fn dispose(&self) {
        if !self.cells().mark_disposed() {
            return;
        }
        let handles = std::mem::take(
            &mut *self
                .triggers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for handle in handles {
            handle.unregister();
        }
        tracing::debug!(key = self.key(), "binding disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.cells().is_disposed()
    }

    /// Number of triggers currently registered for this binding
    pub fn trigger_count(&self) -> usize {
        self.triggers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Kinds of the triggers currently registered for this binding
    pub fn trigger_kinds(&self) -> Vec<TriggerKind> {
        self.triggers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(TriggerHandle::kind)
            .collect()
    }

    fn cells(&self) -> &Cells<T, E> {
        self.revalidator.cells()
    }
}

impl<T, E> std::fmt::Debug for Binding<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.revalidator.key())
            .field("disposed", &self.revalidator.cells().is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_start_with_given_state() {
        let cells: Cells<u32, String> = Cells::new(Some(Arc::new(3)), false);

        assert_eq!(cells.data.borrow().as_deref(), Some(&3));
        assert!(cells.error.borrow().is_none());
        assert!(!*cells.is_validating.borrow());
        assert!(!*cells.is_loading.borrow());
        assert!(!cells.is_disposed());
    }

    #[test]
    fn test_mark_disposed_only_succeeds_once() {
        let cells: Cells<u32, String> = Cells::new(None, true);

        assert!(cells.mark_disposed());
        assert!(!cells.mark_disposed());
        assert!(cells.is_disposed());
    }

    #[test]
    fn test_cells_accept_writes_without_receivers() {
        let cells: Cells<u32, String> = Cells::new(None, true);

        cells.is_loading.send_replace(false);
        cells.data.send_replace(Some(Arc::new(9)));

        assert!(!*cells.is_loading.borrow());
        assert_eq!(cells.data.borrow().as_deref(), Some(&9));
    }
}
