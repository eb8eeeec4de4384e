use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::borders;
use crate::raster::{self, RasterCache};
use crate::registry::RegionRegistry;
use crate::session::MapSession;
use crate::{log_info, log_warn};

/// Error type for map discovery and loading.
#[derive(Debug)]
pub enum MapError {
    /// Config file unreachable.
    ConfigRead(std::io::Error),
    /// Config file is not a valid region document.
    ConfigParse(String),
    /// Raster file unreachable or undecodable.
    ImageLoad(String),
    /// Requested map name is not in the discovered set.
    MapNotFound(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::ConfigRead(e) => write!(f, "Failed to read map config: {}", e),
            MapError::ConfigParse(e) => write!(f, "Invalid map config: {}", e),
            MapError::ImageLoad(e) => write!(f, "Failed to load map image: {}", e),
            MapError::MapNotFound(name) => write!(f, "Map '{}' not found", name),
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::ConfigRead(e)
    }
}

/// One discovered map: its config document and paired raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEntry {
    pub name: String,
    pub label: String,
    pub config_file: PathBuf,
    pub image_file: PathBuf,
}

const CONFIG_PREFIX: &str = "map_";
const CONFIG_SUFFIX: &str = "_config.txt";
const IMAGES_SUBDIR: &str = "maps_images";

/// Scan a maps directory for `map_<name>_config.txt` documents paired with
/// `maps_images/map_<name>.png` rasters. Unpaired configs are skipped with
/// a log line. Returns an ordered name → entry table (BTreeMap, so the map
/// selector lists names alphabetically).
pub fn discover_maps(dir: &Path) -> Result<BTreeMap<String, MapEntry>, std::io::Error> {
    let mut maps = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(name) = file_name
            .strip_prefix(CONFIG_PREFIX)
            .and_then(|s| s.strip_suffix(CONFIG_SUFFIX))
        else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let image_file = dir.join(IMAGES_SUBDIR).join(format!("map_{}.png", name));
        if !image_file.is_file() {
            log_warn!("Map '{}' has a config but no image at {:?}; skipped", name, image_file);
            continue;
        }

        maps.insert(
            name.to_string(),
            MapEntry {
                name: name.to_string(),
                label: format!("{} Map", capitalize(name)),
                config_file: entry.path(),
                image_file,
            },
        );
    }

    log_info!("Discovered {} map(s) in {:?}", maps.len(), dir);
    Ok(maps)
}

/// Look up a map by name, surfacing the miss as a MapError.
pub fn find_map<'a>(
    maps: &'a BTreeMap<String, MapEntry>,
    name: &str,
) -> Result<&'a MapEntry, MapError> {
    maps.get(name)
        .ok_or_else(|| MapError::MapNotFound(name.to_string()))
}

/// Full load pipeline for one map: config text → registry → decoded image
/// → pristine raster copy → boundary mask → fresh session.
///
/// Any failure aborts the load; no partial session state escapes. There is
/// no retry — a failed load needs a new explicit request.
pub fn load_map(entry: &MapEntry) -> Result<MapSession, MapError> {
    let config_text = fs::read_to_string(&entry.config_file)?;
    let registry = RegionRegistry::parse(&config_text).map_err(MapError::ConfigParse)?;

    let decoded = image::open(&entry.image_file)
        .map_err(|e| MapError::ImageLoad(e.to_string()))?
        .to_rgba8();

    let raster = RasterCache::capture(&decoded);

    // Exact-match detection needs the raster to actually carry the
    // configured palette. A missing color is loud in the log but not fatal.
    let missing = raster.missing_palette_colors(&registry);
    if !missing.is_empty() {
        log_warn!(
            "Map '{}': {} configured color(s) absent from the raster ({}) — was the image recompressed?",
            entry.name,
            missing.len(),
            raster::describe_missing(&missing)
        );
    }

    let mask = borders::extract(&raster);
    log_info!(
        "Loaded map '{}': {} regions, {}x{} px, {} border pixels",
        entry.name,
        registry.len(),
        raster.width(),
        raster.height(),
        mask.len()
    );

    Ok(MapSession::new(entry.name.clone(), registry, raster, mask))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
