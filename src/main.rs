//! Policy Cache demo driver
//!
//! Builds a cache from environment configuration, runs a small workload
//! against it and reports the outcome through tracing.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use policy_cache::{get_or_create_cache, global_registry, CacheConfig};

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("loading cache configuration")?;
    info!(
        "Configuration loaded: policy={}, capacity={}, max_capacity={}, default_expiry={:?}, sweep_interval={:?}",
        config.policy_kind,
        config.capacity,
        config.max_capacity,
        config.default_expiry,
        config.sweep_interval
    );

    let cache = get_or_create_cache(&config).context("creating cache instance")?;

    // Write past the bound so bounded policies have to evict
    let writes = config.max_capacity + config.max_capacity / 2;
    for i in 0..writes {
        cache.set_typed(&format!("key{i}"), i, None);
        if i % 3 == 0 {
            let _ = cache.get_typed::<usize>("key0");
        }
    }

    let hits = (0..writes)
        .filter(|i| cache.get_typed::<usize>(&format!("key{i}")) == Some(*i))
        .count();
    info!(
        writes,
        hits,
        occupancy = cache.len(),
        "Workload finished against {} cache",
        cache.kind()
    );

    let closed = global_registry().shutdown();
    info!("Shut down {} cache instance(s)", closed);
    Ok(())
}
