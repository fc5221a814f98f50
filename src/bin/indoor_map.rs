//! indoor-map headless binary
//!
//! Loads a building from a cartography dataset file, mounts the map
//! controller on the in-memory recording surface, applies the requested
//! floor / search / selection, and prints what the UI would show plus the
//! surface operations it took to get there.
//!
//! ## Configuration (flags > env / TOML via `config` crate)
//!
//! | Key                       | Default   | Description                          |
//! |---------------------------|-----------|--------------------------------------|
//! | `INDOOR_MAP_DATASET`      | –         | Dataset JSON (required)              |
//! | `INDOOR_MAP_BUILDING_ID`  | `7033`    | Building to load                     |
//! | `INDOOR_MAP_FLOOR`        | first     | Floor id, or `all`                   |
//! | `INDOOR_MAP_SEARCH`       | –         | Search text (debounced)              |
//! | `INDOOR_MAP_SELECT`       | –         | POI id selected from the list        |
//! | `INDOOR_MAP_CLICK`        | –         | POI id whose map marker is clicked   |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use indoor_map::{
    config::{BUILDING_ID, SEARCH_DEBOUNCE},
    types::{BuildingId, FloorId, PoiId},
    ui, BuildingLoader, BuildingStore, CartographyDataset, ContainerId, MapController,
    RecordingFactory, SearchDebouncer,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "indoor-map", about = "Indoor building map (headless)", version)]
struct Args {
    /// Optional settings file (TOML)
    #[arg(long, env = "INDOOR_MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Cartography dataset (JSON)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Building to load
    #[arg(long)]
    building_id: Option<BuildingId>,

    /// Floor id to select, or "all"
    #[arg(long)]
    floor: Option<String>,

    /// Search text
    #[arg(long)]
    search: Option<String>,

    /// Select a POI from the list
    #[arg(long)]
    select: Option<PoiId>,

    /// Click a POI's map marker
    #[arg(long)]
    click: Option<PoiId>,

    /// Print the surface operation journal
    #[arg(long)]
    journal: bool,

    /// Log filter directive
    #[arg(long, env = "INDOOR_MAP_LOG", default_value = "indoor_map=debug")]
    log: String,
}

/// File / environment layer under the flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    dataset: Option<PathBuf>,
    building_id: Option<BuildingId>,
    floor: Option<String>,
    search: Option<String>,
    select: Option<PoiId>,
    click: Option<PoiId>,
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.as_path()).required(true));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix("INDOOR_MAP").try_parsing(true))
        .build()
        .context("reading settings")?;
    settings
        .try_deserialize()
        .context("invalid settings")
}

fn parse_floor(raw: &str) -> Result<Option<FloorId>> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .with_context(|| format!("floor must be an id or 'all', got '{raw}'"))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(args.log.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(args.config.as_ref())?;

    let Some(dataset) = args.dataset.or(settings.dataset) else {
        bail!("no dataset given (--dataset or INDOOR_MAP_DATASET)");
    };
    let building_id = args.building_id.or(settings.building_id).unwrap_or(BUILDING_ID);
    let floor = args.floor.or(settings.floor);
    let search = args.search.or(settings.search);
    let select = args.select.or(settings.select);
    let click = args.click.or(settings.click);

    let _span = tracing::info_span!("indoor-map", building_id).entered();
    tracing::info!("dataset {}", dataset.display());

    let client = Arc::new(
        CartographyDataset::from_path(&dataset)
            .await
            .with_context(|| format!("loading dataset {}", dataset.display()))?,
    );

    let store = Arc::new(BuildingStore::new());
    let mut map = MapController::attach(store.clone(), RecordingFactory::new().ready_on_create());
    let journal = map.factory().journal();
    map.mount(ContainerId::new("map"));

    // Load
    let loader = BuildingLoader::new(client, store.clone());
    let loaded = loader.spawn(building_id).join().await;
    map.process();
    if let Err(e) = loaded {
        println!("{}", ui::app_view(&store));
        return Err(e).context("building load failed");
    }

    // Sidebar interactions
    if let Some(raw) = floor {
        store.set_selected_floor_id(parse_floor(&raw)?);
        map.process();
    }

    if let Some(text) = search {
        let debouncer = SearchDebouncer::new(store.clone());
        debouncer.input(text);
        while debouncer.is_pending() {
            tokio::time::sleep(SEARCH_DEBOUNCE / 4).await;
        }
        map.process();
    }

    if let Some(poi_id) = select {
        store.set_selected_poi_id(Some(poi_id));
        map.process();
    }

    // Map interaction
    if let Some(poi_id) = click {
        match (map.marker_for_poi(poi_id), map.surface_mut()) {
            (Some(marker), Some(surface)) => surface.click_marker(marker),
            _ => tracing::warn!("POI {} has no marker on the map", poi_id),
        }
        map.process();
    }

    // Output
    println!("{}", ui::app_view(&store));
    println!();
    print!("{}", ui::floor_selector(&store));
    println!();
    print!("{}", ui::poi_list(&store));

    if args.journal {
        println!();
        println!("Surface operations:");
        for op in journal.ops() {
            println!("  {op:?}");
        }
    }

    map.unmount();
    Ok(())
}
