//! Trigger sources that request revalidation
//!
//! Each registration spawns its own task and hands back a [`TriggerHandle`].
//! Handles belong to exactly one binding, so unregistering one never touches
//! triggers registered by other bindings, even for the same key.

use std::fmt::Display;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::Revalidator;
use super::env::FocusSignal;

/// Kind of stimulus a trigger reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Host regained foreground focus
    Focus,
    /// Fixed-interval timer tick
    Interval,
}

/// Registration of one trigger for one binding
#[derive(Debug)]
pub(crate) struct TriggerHandle {
    kind: TriggerKind,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TriggerHandle {
    pub(crate) fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Stops the trigger; consuming `self` makes a second unregister impossible
    ///
    /// A revalidation already started by this trigger keeps running.
    pub(crate) fn unregister(self) {
        if self.shutdown_tx.send(()).is_err() {
            // Task already gone; make sure it is not left polling.
            self.task.abort();
        }
        tracing::debug!(kind = ?self.kind, "trigger unregistered");
    }
}

/// Revalidates whenever `focus` fires
pub(crate) fn register_focus<T, E>(
    focus: &FocusSignal,
    revalidator: Revalidator<T, E>,
) -> TriggerHandle
where
    T: Send + Sync + 'static,
    E: Display + Send + Sync + 'static,
{
    let mut events = focus.listen();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    tracing::debug!(key = revalidator.key(), "focus listener added");

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                event = events.recv() => match event {
                    // A burst of missed focus events collapses into one revalidation.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        tracing::debug!(key = revalidator.key(), "revalidating on focus");
                        let revalidator = revalidator.clone();
                        tokio::spawn(async move { revalidator.revalidate().await });
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!(key = revalidator.key(), "focus listener removed");
    });

    TriggerHandle {
        kind: TriggerKind::Focus,
        shutdown_tx,
        task,
    }
}

/// Revalidates every `period`, starting one period after registration
pub(crate) fn register_interval<T, E>(
    period: Duration,
    revalidator: Revalidator<T, E>,
) -> TriggerHandle
where
    T: Send + Sync + 'static,
    E: Display + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    tracing::debug!(key = revalidator.key(), ?period, "refresh timer added");

    let task = tokio::spawn(async move {
        // Skip the first tick (immediate); the initial fetch covers it.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = interval.tick() => {
                    let revalidator = revalidator.clone();
                    tokio::spawn(async move { revalidator.revalidate().await });
                }
            }
        }
        tracing::debug!(key = revalidator.key(), "refresh timer removed");
    });

    TriggerHandle {
        kind: TriggerKind::Interval,
        shutdown_tx,
        task,
    }
}
