//! Music capsule map (mcap-map) - Main entry point
//!
//! Drives the map screen headlessly: loads configuration and a catalog,
//! binds a map surface, applies a search query or mode, optionally taps a
//! marker, and prints what the map shows.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mcap_common::config::{load_config, TomlConfig};
use mcap_common::events::{EventBus, MapEvent};
use mcap_common::Catalog;
use tracing::{info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use mcap_map::filter::MapMode;
use mcap_map::location::{DeniedLocation, FixedLocation, LocationProvider};
use mcap_map::surface::{HeadlessProvider, HeadlessSurface, SurfaceProvider, UnavailableProvider};
use mcap_map::{BindOutcome, MapScreen};

/// Command-line arguments for mcap-map
#[derive(Parser, Debug)]
#[command(name = "mcap-map")]
#[command(about = "Headless music capsule map")]
#[command(version)]
struct Args {
    /// Config file (overrides MCAP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON catalog to load instead of the built-in demo data
    #[arg(long, env = "MCAP_CATALOG")]
    catalog: Option<PathBuf>,

    /// Search query applied to capsules
    #[arg(short, long, default_value = "")]
    search: String,

    /// Map layer: capsules or nearby
    #[arg(short, long, default_value = "capsules")]
    mode: MapMode,

    /// Tap the marker of the item with this id
    #[arg(long)]
    activate: Option<String>,

    /// Simulate a platform without an embedded map
    #[arg(long)]
    no_map: bool,

    /// Simulate a refused location permission
    #[arg(long)]
    deny_location: bool,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn level_directives(level: &str) -> String {
    format!("mcap_map={0},mcap_common={0}", level)
}

/// Install the subscriber before anything else logs
///
/// `RUST_LOG` wins over the config file. Without it, logging starts at
/// `info` and the returned handle switches to the configured level later.
fn init_tracing() -> Option<FilterHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(level_directives("info")), false),
    };
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    (!from_env).then_some(handle)
}

fn apply_log_level(handle: &FilterHandle, config: &TomlConfig) {
    let level = &config.logging.level;
    match EnvFilter::try_new(level_directives(level)) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                warn!("Failed to apply log level '{}': {}", level, e);
            }
        }
        Err(e) => warn!("Invalid log level '{}' in config: {}", level, e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter_handle = init_tracing();
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(handle) = &filter_handle {
        apply_log_level(handle, &config);
    }

    let catalog_path = args.catalog.clone().or_else(|| config.data.catalog_path.clone());
    let catalog = match &catalog_path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            info!("Using built-in demo catalog");
            Catalog::demo()
        }
    };

    let events = EventBus::new(256);
    let mut rx = events.subscribe();
    let log_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!("event: {}", json),
                Err(e) => warn!("Failed to serialize {} event: {}", event.name(), e),
            }
            if matches!(event, MapEvent::TornDown { .. }) {
                break;
            }
        }
    });

    let surface = HeadlessSurface::new();
    let provider: Arc<dyn SurfaceProvider> = if args.no_map {
        Arc::new(UnavailableProvider::new("map disabled on the command line"))
    } else if cfg!(feature = "embedded-map") {
        Arc::new(HeadlessProvider::with_surface(surface.clone()))
    } else {
        mcap_map::surface::default_provider()
    };
    let location: Box<dyn LocationProvider> = if args.deny_location {
        Box::new(DeniedLocation)
    } else {
        Box::new(FixedLocation(config.map.fallback_center()))
    };

    let mut screen = MapScreen::new(catalog, &config, events);
    let outcome = screen.bind(provider.as_ref(), location.as_ref()).await;
    if outcome != BindOutcome::Bound {
        println!("Map unavailable ({:?}); showing fallback panel", outcome);
    }

    if screen.mode() != args.mode {
        screen.set_mode(args.mode);
    }
    if !args.search.trim().is_empty() {
        screen.set_search(args.search.clone());
    }

    for marker in surface.markers() {
        println!(
            "{:>3}  {:<8}  {}  {}",
            marker.id,
            marker.style.to_string(),
            marker.coordinate,
            marker.title
        );
    }
    println!("{} item marker(s) on the map", screen.marker_count());

    if let Some(id) = &args.activate {
        match screen.marker_id(screen.mode().item_kind(), id) {
            Ok(marker) if surface.tap(marker) => {
                if let Some(detail) = screen.selection_detail() {
                    println!("{}", detail.heading());
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                }
            }
            Ok(marker) => warn!("Marker {} for '{}' did not respond to a tap", marker, id),
            Err(e) => warn!("{}", e),
        }
    }

    screen.teardown();
    if let Err(e) = log_task.await {
        warn!("Event logger ended abnormally: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}
