//! Command-line interface parsing for swrkit
//!
//! This module handles parsing of CLI arguments using clap: running the proxy,
//! managing stored credentials, and watching a seller API resource through the
//! revalidating cache.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::swr::{SwrOptions, DEFAULT_DEDUPING_INTERVAL};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified resource name is not recognized
    #[error("Invalid resource: '{0}'. Valid resources: stocks, postings")]
    InvalidResource(String),

    /// The posting window must cover at least one day
    #[error("Invalid --days value: {0}. Must be at least 1")]
    InvalidDays(u32),

    /// `keys set` was given nothing to change
    #[error("Nothing to set: pass --client-id and/or --api-key")]
    NothingToSet,

    /// No credential file location could be determined
    #[error("Cannot locate a config directory; pass --store <PATH>")]
    NoCredentialStore,
}

/// swrkit - revalidating cache and credential proxy for the Ozon seller API
#[derive(Parser, Debug)]
#[command(name = "swrkit")]
#[command(about = "Revalidating cache and credential proxy for the Ozon seller API")]
#[command(version)]
pub struct Cli {
    /// Credential file to use instead of the default config location
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the credential-injecting proxy
    Serve {
        /// Upstream API origin (default: $OZON_BASE_URL or https://api-seller.ozon.ru)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Listen address (default: $SWRKIT_BIND or 127.0.0.1:8787)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Show or change the stored credentials
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Fetch a resource through the proxy and print every update
    ///
    /// Examples:
    ///   swrkit watch stocks
    ///   swrkit watch postings --days 30 --refresh 60
    ///
    /// Valid resources: stocks, postings
    Watch {
        /// Resource to watch
        #[arg(value_name = "RESOURCE")]
        resource: String,

        /// Proxy origin
        #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8787")]
        proxy: String,

        /// Refresh period in seconds (0 disables periodic refresh)
        #[arg(long, value_name = "SECS", default_value_t = 0)]
        refresh: u64,

        /// Minimum seconds between two fetches
        #[arg(long, value_name = "SECS", default_value_t = DEFAULT_DEDUPING_INTERVAL.as_secs())]
        dedupe: u64,

        /// Posting window in days, ending now (postings only)
        #[arg(long, value_name = "DAYS", default_value_t = 7)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Print the stored client id and a masked API key
    Show,
    /// Store a client id and/or API key
    Set {
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Remove both stored values
    Clear,
}

/// Seller API resources that can be watched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Stock levels for all products
    Stocks,
    /// FBO postings in a date window
    Postings,
}

impl Resource {
    /// Parses user input into a Resource.
    ///
    /// Matching is case-insensitive and supports aliases:
    /// - "stocks" | "stock" -> Stocks
    /// - "postings" | "posting" | "fbo" -> Postings
    ///
    /// Returns `None` if the input doesn't match any resource.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Resource> {
        match s.to_lowercase().trim() {
            "stocks" | "stock" => Some(Resource::Stocks),
            "postings" | "posting" | "fbo" => Some(Resource::Postings),
            _ => None,
        }
    }
}

/// Parses a resource string argument into a Resource enum.
pub fn parse_resource_arg(s: &str) -> Result<Resource, CliError> {
    Resource::from_str(s).ok_or_else(|| CliError::InvalidResource(s.to_string()))
}

/// Settings for the `watch` command derived from its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub resource: Resource,
    pub proxy: String,
    pub refresh_interval: Duration,
    pub deduping_interval: Duration,
    /// Posting window start
    pub since: DateTime<Utc>,
    /// Posting window end
    pub to: DateTime<Utc>,
}

impl WatchConfig {
    /// Validates `watch` arguments; the posting window ends at `now`
    pub fn from_args(
        resource: &str,
        proxy: &str,
        refresh: u64,
        dedupe: u64,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, CliError> {
        let resource = parse_resource_arg(resource)?;
        if days == 0 {
            return Err(CliError::InvalidDays(days));
        }
        Ok(Self {
            resource,
            proxy: proxy.to_string(),
            refresh_interval: Duration::from_secs(refresh),
            deduping_interval: Duration::from_secs(dedupe),
            since: now - chrono::Duration::days(i64::from(days)),
            to: now,
        })
    }

    /// Cache key for the watched resource, including its query window
    pub fn cache_key(&self) -> String {
        match self.resource {
            Resource::Stocks => "stocks".to_string(),
            Resource::Postings => format!(
                "postings:{}:{}",
                self.since.to_rfc3339(),
                self.to.to_rfc3339()
            ),
        }
    }

    /// Revalidation options for the watched binding
    pub fn options<T>(&self) -> SwrOptions<T> {
        SwrOptions::new()
            .deduping_interval(self.deduping_interval)
            .refresh_interval(self.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_resource_arg_aliases() {
        assert_eq!(parse_resource_arg("stocks").unwrap(), Resource::Stocks);
        assert_eq!(parse_resource_arg("STOCK").unwrap(), Resource::Stocks);
        assert_eq!(parse_resource_arg("postings").unwrap(), Resource::Postings);
        assert_eq!(parse_resource_arg("fbo").unwrap(), Resource::Postings);
    }

    #[test]
    fn test_parse_resource_arg_invalid() {
        let err = parse_resource_arg("prices").unwrap_err();
        assert!(err.to_string().contains("Invalid resource"));
        assert!(err.to_string().contains("prices"));
    }

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::parse_from(["swrkit", "serve"]);
        match cli.command {
            Command::Serve { base_url, bind } => {
                assert!(base_url.is_none());
                assert!(bind.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.store.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_keys_set() {
        let cli = Cli::parse_from([
            "swrkit",
            "keys",
            "set",
            "--client-id",
            "42",
            "--store",
            "/tmp/c.json",
        ]);
        match cli.command {
            Command::Keys {
                action: KeysAction::Set { client_id, api_key },
            } => {
                assert_eq!(client_id.as_deref(), Some("42"));
                assert!(api_key.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_cli_parse_watch_defaults() {
        let cli = Cli::parse_from(["swrkit", "watch", "stocks"]);
        match cli.command {
            Command::Watch {
                resource,
                proxy,
                refresh,
                dedupe,
                days,
            } => {
                assert_eq!(resource, "stocks");
                assert_eq!(proxy, "http://127.0.0.1:8787");
                assert_eq!(refresh, 0);
                assert_eq!(dedupe, 5);
                assert_eq!(days, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_watch_config_from_args() {
        let config =
            WatchConfig::from_args("postings", "http://proxy", 60, 5, 30, fixed_now()).unwrap();

        assert_eq!(config.resource, Resource::Postings);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.to, fixed_now());
        assert_eq!(config.since, Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_watch_config_rejects_zero_days() {
        let result = WatchConfig::from_args("postings", "http://proxy", 0, 5, 0, fixed_now());
        assert!(matches!(result, Err(CliError::InvalidDays(0))));
    }

    #[test]
    fn test_watch_config_rejects_unknown_resource() {
        let result = WatchConfig::from_args("weather", "http://proxy", 0, 5, 7, fixed_now());
        assert!(matches!(result, Err(CliError::InvalidResource(_))));
    }

    #[test]
    fn test_cache_key_embeds_posting_window() {
        let stocks = WatchConfig::from_args("stocks", "p", 0, 5, 7, fixed_now()).unwrap();
        let postings = WatchConfig::from_args("postings", "p", 0, 5, 7, fixed_now()).unwrap();
        let longer = WatchConfig::from_args("postings", "p", 0, 5, 30, fixed_now()).unwrap();

        assert_eq!(stocks.cache_key(), "stocks");
        assert!(postings.cache_key().starts_with("postings:2024-07-08"));
        assert_ne!(postings.cache_key(), longer.cache_key());
    }

    #[test]
    fn test_watch_options() {
        let config = WatchConfig::from_args("stocks", "p", 30, 2, 7, fixed_now()).unwrap();
        let options: SwrOptions<()> = config.options();

        assert_eq!(options.refresh_interval, Duration::from_secs(30));
        assert_eq!(options.deduping_interval, Duration::from_secs(2));
        assert!(options.revalidate_on_focus);
    }
}
