//! `ideals` -- command-line tracker for template-driven checklists.
//!
//! Keeps profiles in a local JSON data file, fetches their templates over
//! HTTP and reconciles the two on every load.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default            | Description                          |
//! |----------------------------|----------|--------------------|--------------------------------------|
//! | `IDEALS_DATA_FILE`         | no       | `ideals-data.json` | Profile and template cache storage   |
//! | `IDEALS_FETCH_TIMEOUT_SECS`| no       | `30`               | Template request timeout             |
//! | `IDEALS_SAVE_DEBOUNCE_MS`  | no       | `500`              | Delay before edits are written       |
//! | `IDEALS_TEMPLATE_CACHE`    | no       | `true`             | Fall back to cached templates        |
//! | `RUST_LOG`                 | no       | `warn,...=info`    | Log filter (logs go to stderr)       |

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideals_cli::run::run;
use ideals_cli::{Cli, CliConfig};
use ideals_fetch::{FetchConfig, TemplateFetcher};
use ideals_session::{SessionConfig, Tracker};
use ideals_storage::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,ideals_session=info,ideals_fetch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli { command } = Cli::parse();

    let config = CliConfig::from_env();
    let store = FileStore::open(config.data_file.clone())
        .with_context(|| format!("opening data file {}", config.data_file.display()))?;
    let fetcher = TemplateFetcher::new(&FetchConfig::from_env()).context("building HTTP client")?;

    tracing::debug!(data_file = %config.data_file.display(), ?command, "Starting ideals");

    let mut tracker = Tracker::open(fetcher, Arc::new(store), SessionConfig::from_env())?;
    let result = run(&mut tracker, command, &mut std::io::stdout()).await;
    tracker.flush()?;
    result
}
