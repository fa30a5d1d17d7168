// SPDX-License-Identifier: MIT OR Apache-2.0

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roster_auth::Authorizer;
use roster_node::{Config, router};
use roster_store::SqliteStoreBuilder;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub fn setup_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the configuration file.
    #[arg(short = 'b', long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// SQLite database URL, overrides the configuration file.
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    let store = SqliteStoreBuilder::new()
        .database_url(&config.database_url)
        .max_connections(config.max_connections)
        .build()
        .await
        .with_context(|| format!("could not open database {}", config.database_url))?;

    let authorizer = Authorizer::from_config(
        store.clone(),
        &config.authorization.authorizer_config(),
    );

    info!(
        cache_ttl = ?authorizer.cache().ttl(),
        cache_max_entries = ?authorizer.cache().max_entries(),
        resolve_timeout = ?authorizer.resolve_timeout(),
        "authorization configured"
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("could not bind to {}", config.bind))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(authorizer))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    store.close().await;
    info!("shut down");

    Ok(())
}
