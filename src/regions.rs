//! Static table of monitored regions.
//!
//! Each region is an equivalence class of raw 4-digit postal codes mapping to
//! one canonical key (the first code in the class), plus a pattern of accepted
//! city names used to filter offered appointment options.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Raw postal codes per region and the accepted city names, `|`-separated.
/// Multi-code entries are aliases for the same city; the first code is the
/// canonical key and the report column.
static REGIONS: &[(&[u32], &str)] = &[
    (&[3511], "Utrecht"),
    (&[5611], "Eindhoven"),
    (&[5038], "Tilburg"),
    (&[9726], "Groningen"),
    (&[8011], "Zwolle"),
    (&[6041], "Roermond"),
    (&[1011], "Amsterdam"),
    (&[3013], "Rotterdam"),
    (&[2515, 2561], "Den Haag|Loosduinen"),
    (&[7311], "Apeldoorn"),
    (&[6229], "Maastricht"),
    (&[7556], "Hengelo"),
    (&[6541], "Nijmegen"),
    (&[8911], "Leeuwarden"),
    (&[8232], "Lelystad"),
    (&[4462], "Goes"),
    (&[9501], "Stadskanaal"),
    (&[1625], "Hoorn"),
    (&[9291], "Kollum"),
    (&[5401], "Uden"),
    (&[7903], "Hoogeveen"),
    (&[7942], "Meppel"),
    (&[7471], "Goor"),
    (&[5801], "Oostrum"),
];

/// One monitored region: canonical key, its raw-code aliases, and the
/// compiled city-name pattern.
pub struct Region {
    pub key: u32,
    pub raw_codes: &'static [u32],
    pub city: &'static str,
    pattern: Regex,
}

impl Region {
    /// True when a short-address suffix (postal prefix already stripped)
    /// names this region's city.
    pub fn matches_city(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// First accepted city name; used as a human-readable label.
    pub fn label(&self) -> &'static str {
        self.city.split('|').next().unwrap_or(self.city)
    }
}

/// Bidirectional region mapping: canonical key -> region, raw code ->
/// canonical key. Built once per process, immutable afterwards.
pub struct RegionTable {
    regions: Vec<Region>,
    canonical_by_raw: HashMap<u32, u32>,
}

impl RegionTable {
    fn build() -> Self {
        let mut regions = Vec::with_capacity(REGIONS.len());
        let mut canonical_by_raw = HashMap::new();
        for (raw_codes, city) in REGIONS {
            let key = raw_codes[0];
            // Anchored full match against the city alternation.
            let pattern = Regex::new(&format!("^(?:{})$", city))
                .unwrap_or_else(|e| panic!("bad city pattern {city:?}: {e}"));
            for raw in *raw_codes {
                canonical_by_raw.insert(*raw, key);
            }
            regions.push(Region {
                key,
                raw_codes,
                city,
                pattern,
            });
        }
        RegionTable {
            regions,
            canonical_by_raw,
        }
    }

    /// Regions in table order (the report column order).
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Maps a raw postal code to its canonical key, or `None` for a code
    /// outside the table.
    pub fn canonical(&self, raw: u32) -> Option<u32> {
        self.canonical_by_raw.get(&raw).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

lazy_static! {
    static ref TABLE: RegionTable = RegionTable::build();
}

/// The process-wide region table.
pub fn region_table() -> &'static RegionTable {
    &TABLE
}
