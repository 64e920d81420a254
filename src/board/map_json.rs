//! WarZone map JSON.
//!
//! ```json
//! {
//!   "name": "Sample",
//!   "territories": [{"id": "1", "name": "A", "connectedTo": [2]}],
//!   "bonuses": [{"id": "1", "name": "First", "value": "2", "territoryIDs": [1]}]
//! }
//! ```
//!
//! Ids, rewards and neighbor entries may be JSON numbers or numeric strings.
//! The same shape (with plain numbers) is produced by [`map_to_json`] and
//! sent to V1 bots as `setup_map`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::map::{Map, MapError};
use super::region::{Region, SuperRegion};

/// Errors raised while reading a map definition.
#[derive(Debug, Error)]
pub enum MapJsonError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid map JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("'{0}' is not a valid non-negative integer")]
    BadNumber(String),

    #[error("region {neighbor} is listed twice as a neighbour of {region}")]
    DuplicateNeighbor { region: u32, neighbor: u32 },

    #[error("region {region} is listed twice as a member of bonus {bonus}")]
    DuplicateMember { bonus: u32, region: u32 },

    #[error(transparent)]
    Map(#[from] MapError),
}

/// A number that WarZone files write either bare or quoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum JsonNumber {
    Int(u32),
    Text(String),
}

impl JsonNumber {
    fn value(&self) -> Result<u32, MapJsonError> {
        match self {
            JsonNumber::Int(n) => Ok(*n),
            JsonNumber::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| MapJsonError::BadNumber(s.clone())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MapDef {
    name: String,
    territories: Vec<TerritoryDef>,
    #[serde(default)]
    bonuses: Vec<BonusDef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TerritoryDef {
    id: JsonNumber,
    name: String,
    #[serde(rename = "connectedTo")]
    connected_to: Vec<JsonNumber>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BonusDef {
    id: JsonNumber,
    name: String,
    value: JsonNumber,
    #[serde(rename = "territoryIDs")]
    territory_ids: Vec<JsonNumber>,
}

/// Parses a map definition and builds a validated [`Map`].
pub fn parse_map(json: &str) -> Result<Map, MapJsonError> {
    let def: MapDef = serde_json::from_str(json)?;

    let mut regions = Vec::with_capacity(def.territories.len());
    for territory in &def.territories {
        let id = territory.id.value()?;
        let mut neighbors = BTreeSet::new();
        for entry in &territory.connected_to {
            let neighbor = entry.value()?;
            if !neighbors.insert(neighbor) {
                return Err(MapJsonError::DuplicateNeighbor { region: id, neighbor });
            }
        }
        regions.push(Region::new(id, territory.name.clone(), neighbors));
    }

    let mut bonuses = Vec::with_capacity(def.bonuses.len());
    for bonus in &def.bonuses {
        let id = bonus.id.value()?;
        let mut members = BTreeSet::new();
        for entry in &bonus.territory_ids {
            let region = entry.value()?;
            if !members.insert(region) {
                return Err(MapJsonError::DuplicateMember { bonus: id, region });
            }
        }
        bonuses.push(SuperRegion::new(id, bonus.name.clone(), bonus.value.value()?, members));
    }

    Ok(Map::new(def.name, regions, bonuses)?)
}

/// Reads and parses a map file.
pub fn load_map(path: &Path) -> Result<Map, MapJsonError> {
    let json = fs::read_to_string(path).map_err(|source| MapJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_map(&json)
}

/// Renders the map definition (identity and graph only, no standings) as
/// single-line JSON.
pub fn map_to_json(map: &Map) -> String {
    let def = MapDef {
        name: map.name().to_string(),
        territories: map
            .regions()
            .map(|r| TerritoryDef {
                id: JsonNumber::Int(r.id),
                name: r.name.clone(),
                connected_to: r.neighbors.iter().map(|&n| JsonNumber::Int(n)).collect(),
            })
            .collect(),
        bonuses: map
            .super_regions()
            .map(|b| BonusDef {
                id: JsonNumber::Int(b.id),
                name: b.name.clone(),
                value: JsonNumber::Int(b.reward),
                territory_ids: b.regions.iter().map(|&r| JsonNumber::Int(r)).collect(),
            })
            .collect(),
    };
    serde_json::to_string(&def).unwrap_or_else(|_| "{}".to_string())
}
