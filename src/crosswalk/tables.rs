use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::env;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// region code → lowercased locality → urban area code
pub type UrbanAreaLookup = HashMap<String, HashMap<String, String>>;

/// urban area code → (CBSA code, CBSA name) pairs, in provider order
pub type CbsaLookup = HashMap<String, Vec<(String, String)>>;

pub const PLACE_UA_FILE: &str = "place_ua.json";
pub const COUSUB_UA_FILE: &str = "cousub_ua.json";
pub const UA_CBSA_FILE: &str = "ua_cbsa.json";

const DEFAULT_CROSSWALK_DIR: &str = "data/crosswalk";

/// Source of the three crosswalk tables.
///
/// Implementations must key regions by uppercase postal abbreviation and
/// localities in lowercase.
pub trait CrosswalkProvider {
    fn place_ua(&self) -> &UrbanAreaLookup;
    fn cousub_ua(&self) -> &UrbanAreaLookup;
    fn ua_cbsa(&self) -> &CbsaLookup;
}

/// Where to find the crosswalk JSON files
#[derive(Debug, Clone)]
pub struct CrosswalkConfig {
    pub data_dir: PathBuf,
}

impl CrosswalkConfig {
    /// Read `CROSSWALK_DIR`, defaulting to `data/crosswalk`
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("CROSSWALK_DIR")
                .ok()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CROSSWALK_DIR)),
        }
    }
}

/// In-memory crosswalk tables, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct CrosswalkTables {
    place_ua: UrbanAreaLookup,
    cousub_ua: UrbanAreaLookup,
    ua_cbsa: CbsaLookup,
}

impl CrosswalkTables {
    /// Build from raw maps, normalizing region and locality keys
    pub fn new(
        place_ua: UrbanAreaLookup,
        cousub_ua: UrbanAreaLookup,
        ua_cbsa: CbsaLookup,
    ) -> Self {
        Self {
            place_ua: normalize_keys(place_ua),
            cousub_ua: normalize_keys(cousub_ua),
            ua_cbsa,
        }
    }

    /// Load `place_ua.json`, `cousub_ua.json` and `ua_cbsa.json` from a directory
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| {
            let path = dir.join(name);
            File::open(&path)
                .map(BufReader::new)
                .with_context(|| format!("Failed to open crosswalk table {}", path.display()))
        };

        let tables = Self::from_readers(
            open(PLACE_UA_FILE)?,
            open(COUSUB_UA_FILE)?,
            open(UA_CBSA_FILE)?,
        )
        .with_context(|| format!("Failed to load crosswalk tables from {}", dir.display()))?;

        tracing::info!(
            dir = %dir.display(),
            place_regions = tables.place_ua.len(),
            cousub_regions = tables.cousub_ua.len(),
            urban_areas = tables.ua_cbsa.len(),
            "Loaded crosswalk tables"
        );

        Ok(tables)
    }

    /// Load the three tables from JSON readers
    pub fn from_readers<A: Read, B: Read, C: Read>(
        place_ua: A,
        cousub_ua: B,
        ua_cbsa: C,
    ) -> Result<Self> {
        let place_ua: UrbanAreaLookup = serde_json::from_reader(place_ua)
            .context("Failed to parse place to urban area table")?;
        let cousub_ua: UrbanAreaLookup = serde_json::from_reader(cousub_ua)
            .context("Failed to parse county subdivision to urban area table")?;
        let ua_cbsa: CbsaLookup = serde_json::from_reader(ua_cbsa)
            .context("Failed to parse urban area to CBSA table")?;

        Ok(Self::new(place_ua, cousub_ua, ua_cbsa))
    }
}

impl CrosswalkProvider for CrosswalkTables {
    fn place_ua(&self) -> &UrbanAreaLookup {
        &self.place_ua
    }

    fn cousub_ua(&self) -> &UrbanAreaLookup {
        &self.cousub_ua
    }

    fn ua_cbsa(&self) -> &CbsaLookup {
        &self.ua_cbsa
    }
}

/// Keys that collide after normalization keep the entry whose original key
/// sorts first.
fn normalize_keys(lookup: UrbanAreaLookup) -> UrbanAreaLookup {
    let mut regions: Vec<_> = lookup.into_iter().collect();
    regions.sort_by(|a, b| a.0.cmp(&b.0));

    let mut normalized: UrbanAreaLookup = HashMap::with_capacity(regions.len());
    for (region, localities) in regions {
        let region = region.trim().to_ascii_uppercase();
        let table = normalized.entry(region.clone()).or_default();

        let mut localities: Vec<_> = localities.into_iter().collect();
        localities.sort_by(|a, b| a.0.cmp(&b.0));
        for (locality, ua) in localities {
            match table.entry(locality.trim().to_lowercase()) {
                Entry::Vacant(slot) => {
                    slot.insert(ua);
                }
                Entry::Occupied(slot) if *slot.get() != ua => {
                    tracing::warn!(
                        %region,
                        locality = %slot.key(),
                        kept = %slot.get(),
                        dropped = %ua,
                        "Conflicting urban areas for locality"
                    );
                }
                Entry::Occupied(_) => {}
            }
        }
    }
    normalized
}
