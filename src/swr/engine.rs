//! Revalidation engine
//!
//! [`Swr::acquire`] hands out bindings; [`Revalidator::revalidate`] decides
//! whether a key is due for a fetch and applies the outcome to the cache
//! store and the binding's cells.
//!
//! Revalidations issued through one binding run one at a time. Bindings that
//! share a key are not coordinated with each other: two of them may both pass
//! the deduping check before either records its result, so duplicate fetches
//! for one key are possible when triggers fire together.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;

use super::binding::{Binding, Cells};
use super::env::Environment;
use super::options::SwrOptions;
use super::store::CacheStore;
use super::triggers;

/// Type-erased zero-argument fetch function
pub type Fetcher<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Factory for bindings over a shared cache store
///
/// Cloning is cheap and yields a handle on the same store.
pub struct Swr<T> {
    store: Arc<CacheStore<T>>,
    env: Environment,
}

impl<T> Clone for Swr<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            env: self.env.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Swr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swr")
            .field("entries", &self.store.len())
            .field("env", &self.env)
            .finish()
    }
}

impl<T> Swr<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an engine with a fresh, empty store
    pub fn new(env: Environment) -> Self {
        Self::with_store(Arc::new(CacheStore::new()), env)
    }

    /// Creates an engine over an existing store
    pub fn with_store(store: Arc<CacheStore<T>>, env: Environment) -> Self {
        Self { store, env }
    }

    pub fn store(&self) -> &Arc<CacheStore<T>> {
        &self.store
    }

    /// Acquires a live binding for `key`
    ///
    /// The binding starts from the cached value (or `initial_data`), an
    /// initial revalidation is spawned, and the triggers enabled by `options`
    /// and supported by the environment are registered.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn acquire<E, F, Fut>(
        &self,
        key: impl Into<String>,
        fetcher: F,
        options: SwrOptions<T>,
    ) -> Binding<T, E>
    where
        E: Display + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key: Arc<str> = Arc::from(key.into());
        let fetcher: Fetcher<T, E> = Arc::new(move || fetcher().boxed());
        let refresh_interval = options.refresh_enabled().then_some(options.refresh_interval);
        let SwrOptions {
            deduping_interval,
            revalidate_on_focus,
            initial_data,
            ..
        } = options;

        let data = self.store.get(&key).or_else(|| initial_data.map(Arc::new));
        let is_loading = !self.store.has_entry(&key);
        let cells = Arc::new(Cells::new(data, is_loading));

        let revalidator = Revalidator {
            key: Arc::clone(&key),
            store: Arc::clone(&self.store),
            fetcher,
            deduping_interval,
            cells,
        };

        let initial = revalidator.clone();
        tokio::spawn(async move { initial.revalidate().await });

        let mut handles = Vec::new();
        if revalidate_on_focus {
            if let Some(focus) = &self.env.focus {
                handles.push(triggers::register_focus(focus, revalidator.clone()));
            }
        }
        if let Some(period) = refresh_interval.filter(|_| self.env.timers) {
            handles.push(triggers::register_interval(period, revalidator.clone()));
        }
        tracing::debug!(key = %key, triggers = handles.len(), "binding acquired");

        Binding::new(revalidator, handles)
    }
}

/// Revalidation bound to one binding's key, fetcher and cells
pub(crate) struct Revalidator<T, E> {
    key: Arc<str>,
    store: Arc<CacheStore<T>>,
    fetcher: Fetcher<T, E>,
    deduping_interval: Duration,
    cells: Arc<Cells<T, E>>,
}

impl<T, E> Clone for Revalidator<T, E> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            deduping_interval: self.deduping_interval,
            cells: Arc::clone(&self.cells),
        }
    }
}

impl<T, E> Revalidator<T, E> {
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn cells(&self) -> &Cells<T, E> {
        &self.cells
    }
}

impl<T, E> Revalidator<T, E>
where
    T: Send + Sync + 'static,
    E: Display + Send + Sync + 'static,
{
    /// Fetches the key unless it was fetched successfully within the deduping interval
    ///
    /// Failures end up in the `error` cell and leave `data` and the store untouched.
    pub(crate) async fn revalidate(&self) {
        if self.cells.is_disposed() {
            return;
        }
        let _gate = self.cells.fetch_gate.lock().await;
        if self.cells.is_disposed() {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.store.last_fetched(&self.key) {
            if now.duration_since(last) < self.deduping_interval {
                tracing::trace!(key = %self.key, "revalidation deduped");
                self.adopt_cached();
                return;
            }
        }

        tracing::debug!(key = %self.key, "revalidating");
        self.cells.is_validating.send_replace(true);

        let outcome = (self.fetcher)().await;
        let disposed = self.cells.is_disposed();
        match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                self.store.record(&self.key, Arc::clone(&value), now);
                if !disposed {
                    self.cells.data.send_replace(Some(value));
                    self.cells.error.send_replace(None);
                }
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "fetch failed, keeping stale data");
                if !disposed {
                    self.cells.error.send_replace(Some(Arc::new(err)));
                }
            }
        }

        if disposed {
            tracing::debug!(key = %self.key, "binding disposed during fetch, result not applied");
            return;
        }
        self.cells.is_validating.send_replace(false);
        self.cells.is_loading.send_replace(false);
    }

    /// Finishes loading from the store when another binding already fetched the key
    fn adopt_cached(&self) {
        if !*self.cells.is_loading.borrow() {
            return;
        }
        if let Some(value) = self.store.get(&self.key) {
            self.cells.data.send_replace(Some(value));
        }
        self.cells.is_loading.send_replace(false);
    }
}
