use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::config::AppConfig;
use transit_server::feed::Catalogue;
use transit_server::planner::Dispatcher;
use transit_server::realtime::{RealtimeClient, RealtimeConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let catalogue = Arc::new(Catalogue::load(&config.modes_to_load)?);
    for dup in catalogue.warnings() {
        warn!(%dup, "Merge warning");
    }

    let dispatcher = Dispatcher::with_fuzzy_min_score(
        Arc::clone(&catalogue),
        config.planner(),
        config.fuzzy_min_score,
    );

    match RealtimeConfig::from_env() {
        Some(realtime_config) => {
            let _client =
                RealtimeClient::new(realtime_config.with_cache_ttl(config.realtime_cache_ttl_secs))?;
            info!("Realtime overlay enabled");
        }
        None => info!("Realtime overlay disabled"),
    }

    info!(
        modes = ?dispatcher.modes().iter().map(|m| m.as_str().to_string()).collect::<Vec<_>>(),
        stops = catalogue.iter_stops().count(),
        trips = catalogue.iter_trips().count(),
        "Catalogue loaded; planner ready"
    );

    Ok(())
}
