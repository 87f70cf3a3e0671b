//! Per-binding revalidation options

use std::time::Duration;

/// Default minimum time between two successful fetches of the same key
pub const DEFAULT_DEDUPING_INTERVAL: Duration = Duration::from_millis(5000);

/// Options recognised by [`Swr::acquire`](super::Swr::acquire)
#[derive(Debug, Clone)]
pub struct SwrOptions<T> {
    /// Minimum time since the last successful fetch before `revalidate` fetches again
    pub deduping_interval: Duration,
    /// Whether to revalidate when the host regains focus
    pub revalidate_on_focus: bool,
    /// Period of the refresh timer; zero disables it
    pub refresh_interval: Duration,
    /// Value shown before the first fetch when the cache has nothing for the key
    pub initial_data: Option<T>,
}

impl<T> Default for SwrOptions<T> {
    fn default() -> Self {
        Self {
            deduping_interval: DEFAULT_DEDUPING_INTERVAL,
            revalidate_on_focus: true,
            refresh_interval: Duration::ZERO,
            initial_data: None,
        }
    }
}

impl<T> SwrOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deduping_interval(mut self, interval: Duration) -> Self {
        self.deduping_interval = interval;
        self
    }

    pub fn revalidate_on_focus(mut self, enabled: bool) -> Self {
        self.revalidate_on_focus = enabled;
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Returns true if a periodic refresh timer was requested
    pub fn refresh_enabled(&self) -> bool {
        !self.refresh_interval.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options: SwrOptions<()> = SwrOptions::default();
        assert_eq!(options.deduping_interval, Duration::from_secs(5));
        assert!(options.revalidate_on_focus);
        assert_eq!(options.refresh_interval, Duration::ZERO);
        assert!(!options.refresh_enabled());
        assert!(options.initial_data.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = SwrOptions::new()
            .deduping_interval(Duration::from_millis(100))
            .revalidate_on_focus(false)
            .refresh_interval(Duration::from_secs(1))
            .initial_data(7);

        assert_eq!(options.deduping_interval, Duration::from_millis(100));
        assert!(!options.revalidate_on_focus);
        assert!(options.refresh_enabled());
        assert_eq!(options.initial_data, Some(7));
    }
}
