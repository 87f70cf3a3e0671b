//! swrkit - revalidating cache and credential proxy for the Ozon seller API
//!
//! `serve` runs the proxy that injects seller credentials into forwarded
//! requests, `keys` manages the stored credentials, and `watch` keeps a
//! resource fresh through the revalidating cache and prints every change.

use std::error::Error;

use chrono::{Local, Utc};
use clap::Parser;
use serde_json::Value;

use swrkit::api::OzonClient;
use swrkit::cli::{Cli, CliError, Command, KeysAction, Resource, WatchConfig};
use swrkit::config::ProxyConfig;
use swrkit::credentials::CredentialStore;
use swrkit::logging;
use swrkit::swr::{Binding, Environment, Swr};

/// Resolves the credential store from `--store` or the default location
fn credential_store(cli: &Cli) -> Result<CredentialStore, CliError> {
    cli.store
        .clone()
        .map(CredentialStore::with_path)
        .or_else(CredentialStore::new)
        .ok_or(CliError::NoCredentialStore)
}

fn run_keys(store: &CredentialStore, action: KeysAction) -> Result<(), Box<dyn Error>> {
    match action {
        KeysAction::Show => {
            let credentials = store.load();
            println!("store:     {}", store.path().display());
            println!("client id: {}", credentials.client_id);
            println!("api key:   {}", credentials.masked_api_key());
        }
        KeysAction::Set { client_id, api_key } => {
            if client_id.is_none() && api_key.is_none() {
                return Err(CliError::NothingToSet.into());
            }
            let credentials = store.update(|c| {
                if let Some(id) = client_id {
                    c.client_id = id;
                }
                if let Some(key) = api_key {
                    c.api_key = key;
                }
            })?;
            println!("Saved credentials for client id '{}'", credentials.client_id);
        }
        KeysAction::Clear => {
            store.save(&Default::default())?;
            println!("Cleared credentials in {}", store.path().display());
        }
    }
    Ok(())
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Prints binding updates until Ctrl-C
async fn print_updates(binding: &Binding<Value, swrkit::api::ApiError>) {
    let mut data = binding.subscribe_data();
    let mut error = binding.subscribe_error();
    let mut validating = binding.subscribe_validating();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Ok(()) = data.changed() => {
                let snapshot = data.borrow_and_update().clone();
                if let Some(value) = snapshot {
                    let text = serde_json::to_string_pretty(&*value).unwrap_or_default();
                    println!("[{}] {} updated\n{}", timestamp(), binding.key(), text);
                }
            }
            Ok(()) = error.changed() => {
                let snapshot = error.borrow_and_update().clone();
                if let Some(err) = snapshot {
                    eprintln!(
                        "[{}] {} failed: {} (showing last good data)",
                        timestamp(),
                        binding.key(),
                        err
                    );
                }
            }
            Ok(()) = validating.changed() => {
                if *validating.borrow_and_update() {
                    tracing::info!(key = binding.key(), "refreshing");
                }
            }
        }
    }
}

async fn run_watch(store: &CredentialStore, config: WatchConfig) {
    let client = OzonClient::new(config.proxy.clone(), store.load());
    let swr: Swr<Value> = Swr::new(Environment::headless());
    let (since, to) = (config.since, config.to);

    let binding = match config.resource {
        Resource::Stocks => swr.acquire(
            config.cache_key(),
            move || {
                let client = client.clone();
                async move { client.stocks().await }
            },
            config.options(),
        ),
        Resource::Postings => swr.acquire(
            config.cache_key(),
            move || {
                let client = client.clone();
                async move { client.fbo_postings(since, to).await }
            },
            config.options(),
        ),
    };

    print_updates(&binding).await;
    binding.dispose();
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = credential_store(&cli);
    match cli.command {
        Command::Serve { base_url, bind } => {
            let config = ProxyConfig::from_env()?.with_overrides(base_url, bind)?;
            swrkit::proxy::serve(config).await?;
        }
        Command::Keys { action } => run_keys(&store?, action)?,
        Command::Watch {
            resource,
            proxy,
            refresh,
            dedupe,
            days,
        } => {
            let config =
                WatchConfig::from_args(&resource, &proxy, refresh, dedupe, days, Utc::now())?;
            run_watch(&store?, config).await;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
