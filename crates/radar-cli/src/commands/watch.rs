use std::future::{pending, Future};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use radar_core::geo::{FixedGeolocation, GeolocationProvider};
use radar_core::state::FeedState;
use radar_core::store::HotspotStore;
use radar_core::HotspotManager;

use crate::commands::common::{format_hotspot_lines, open_store};
use crate::config::load_config;
use crate::error::CliError;

pub async fn run_watch(seconds: Option<u64>, config_path: &Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let geolocation = config
        .default_coordinate()
        .map_or_else(FixedGeolocation::denied, FixedGeolocation::granted);

    let manager = HotspotManager::new(
        Arc::new(store),
        Arc::new(geolocation),
        config.hotspot_settings(),
    );

    let stop = async {
        let deadline = async {
            match seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
                None => pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            () = deadline => {}
        }
    };

    let result = watch_until(&manager, stop, &mut io::stdout()).await;
    manager.deactivate().await;
    result.map(|_| ())
}

/// Activate `manager` and print every snapshot until `stop` resolves.
/// Returns how many snapshots were printed.
pub async fn watch_until<S, G>(
    manager: &HotspotManager<S, G>,
    stop: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<usize, CliError>
where
    S: HotspotStore,
    G: GeolocationProvider,
{
    let report = manager.initialize().await;
    // Receivers created after activation start with the loaded set marked seen.
    let mut hotspots = manager.watch_hotspots();
    let mut feed = manager.watch_feed();

    if !report.feed.is_live() {
        eprintln!("Live updates unavailable; showing expiry only.");
    }
    write_snapshot(manager, out).await?;
    let mut printed = 1;

    tokio::pin!(stop);
    loop {
        tokio::select! {
            () = &mut stop => break,
            changed = hotspots.changed() => {
                if changed.is_err() {
                    break;
                }
                write_snapshot(manager, out).await?;
                printed += 1;
            }
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                if *feed.borrow_and_update() == FeedState::Disconnected {
                    eprintln!("Live updates disconnected; showing expiry only.");
                }
            }
        }
    }

    Ok(printed)
}

async fn write_snapshot<S: HotspotStore, G: GeolocationProvider>(
    manager: &HotspotManager<S, G>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let now = Utc::now();
    let owned_id = manager.owned_id().await;
    writeln!(out, "--- {} ---", now.format("%H:%M:%S"))?;
    for line in format_hotspot_lines(&manager.snapshot(), now, owned_id) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
