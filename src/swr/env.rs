//! Host capabilities available to trigger sources
//!
//! Whether the runtime has a foreground-focus signal or a timer facility is
//! supplied explicitly instead of being detected, so tests can simulate
//! either situation.

use tokio::sync::broadcast;

/// Buffered focus events per listener before older ones are collapsed
const FOCUS_CHANNEL_CAPACITY: usize = 16;

/// Broadcasts "regained foreground focus" events to registered listeners
///
/// Every [`listen`](FocusSignal::listen) call creates an independent
/// listener; dropping it removes exactly that listener.
#[derive(Debug, Clone)]
pub struct FocusSignal {
    sender: broadcast::Sender<()>,
}

impl Default for FocusSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FOCUS_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Signals that the host regained focus
    ///
    /// Returns the number of listeners that were notified.
    pub fn notify(&self) -> usize {
        self.sender.send(()).unwrap_or(0)
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn listen(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

/// Capabilities of the environment bindings run in
#[derive(Debug, Clone)]
pub struct Environment {
    /// Focus signal, absent in non-interactive contexts
    pub focus: Option<FocusSignal>,
    /// Whether recurring timers may be registered
    pub timers: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self::headless()
    }
}

impl Environment {
    /// Timers but no focus signal, e.g. a server or CLI process
    pub fn headless() -> Self {
        Self {
            focus: None,
            timers: true,
        }
    }

    /// Timers plus the given focus signal
    pub fn interactive(focus: FocusSignal) -> Self {
        Self {
            focus: Some(focus),
            timers: true,
        }
    }

    /// Neither focus signal nor timers
    pub fn bare() -> Self {
        Self {
            focus: None,
            timers: false,
        }
    }
}
