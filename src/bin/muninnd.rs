//! muninnd — Muninn daemon.
//!
//! Serves the reference-resolution API over HTTP, fronting the GitHub
//! REST API with a bounded, TTL-aware response cache.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muninn::cache::ReferenceCache;
use muninn::resolver::Resolver;
use muninn::server::config::Config;
use muninn::server::{AppState, serve};
use muninn::sources::{CommitSource, GithubClient, ReferenceSource, ReleaseSource, TagSource};

/// Muninn daemon — caching reference resolution service.
#[derive(Parser)]
#[command(name = "muninnd")]
#[command(version = muninn::PKG_VERSION)]
#[command(about = "Muninn reference resolution daemon")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let client = GithubClient::with_base_url(
        config.github_api_url.clone(),
        config.github_token.clone(),
    );

    let mut sources: Vec<Arc<dyn ReferenceSource>> =
        vec![Arc::new(ReleaseSource::new(client.clone()))];
    if config.tags_enabled {
        sources.push(Arc::new(TagSource::new(client.clone())));
    }
    sources.push(Arc::new(CommitSource::new(client)));

    let cache = ReferenceCache::new(config.cache_config());
    let resolver = Resolver::new(cache, sources)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!(
        version = muninn::version_string(),
        %addr,
        cache_size = config.cache_size,
        tags_enabled = config.tags_enabled,
        "muninnd starting"
    );

    serve(
        addr,
        AppState {
            resolver: Arc::new(resolver),
        },
    )
    .await?;

    Ok(())
}
