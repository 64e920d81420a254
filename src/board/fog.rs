//! Fog of war.
//!
//! Produces a per-player view of the live map where regions outside the
//! player's visibility have their army count and/or owner hidden. The view
//! carries only the mutable part of each region (owner, armies); identity
//! and neighbors are public knowledge sent once at setup.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::map::Map;
use super::region::{Owner, RegionId, OWNER_FOG};

/// Visibility policy, from most to least visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FogLevel {
    /// Everything visible.
    #[serde(rename = "NoFog")]
    None,
    /// Armies hidden outside the visible set, owners always shown.
    #[serde(rename = "LightFog")]
    Light,
    /// Armies and owners hidden outside the visible set.
    #[default]
    #[serde(rename = "Foggy")]
    Normal,
    /// Armies hidden outside owned regions, owners hidden outside the visible set.
    #[serde(rename = "VeryFoggy")]
    Heavy,
    /// Armies and owners hidden outside owned regions.
    #[serde(rename = "ExtremeFog")]
    Extreme,
}

/// One region as seen by a player. `None` means hidden by fog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub id: RegionId,
    pub owner: Option<Owner>,
    pub armies: Option<u32>,
}

impl Standing {
    /// Owner name, or `fog` when hidden.
    pub fn owner_name(&self) -> &str {
        self.owner.as_ref().map_or(OWNER_FOG, Owner::name)
    }

    /// Army count, or -1 when hidden.
    pub fn armies_or_unknown(&self) -> i64 {
        self.armies.map_or(-1, i64::from)
    }

    pub fn is_fogged(&self) -> bool {
        self.owner.is_none() || self.armies.is_none()
    }
}

/// A full set of standings in ascending region id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapView {
    pub standings: Vec<Standing>,
}

impl MapView {
    /// The unfogged standings of every region.
    pub fn full(map: &Map) -> Self {
        MapView {
            standings: map
                .regions()
                .map(|r| Standing {
                    id: r.id,
                    owner: Some(r.owner.clone()),
                    armies: Some(r.armies),
                })
                .collect(),
        }
    }

    pub fn get(&self, id: RegionId) -> Option<&Standing> {
        self.standings
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.standings[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Standing> {
        self.standings.iter()
    }
}

/// Returns the map as `player` is allowed to see it under `fog`.
pub fn apply_fog(map: &Map, player: &str, fog: FogLevel) -> MapView {
    let mut view = MapView::full(map);

    let owned = || map.owned_regions(player);
    let visible = || map.visible_regions(player);

    // Owner visibility is always a superset of army visibility.
    let (army_visible, owner_visible): (BTreeSet<RegionId>, Option<BTreeSet<RegionId>>) = match fog {
        FogLevel::None => return view,
        FogLevel::Light => (visible(), None),
        FogLevel::Normal => {
            let v = visible();
            (v.clone(), Some(v))
        }
        FogLevel::Heavy => (owned(), Some(visible())),
        FogLevel::Extreme => {
            let o = owned();
            (o.clone(), Some(o))
        }
    };

    for standing in &mut view.standings {
        if army_visible.contains(&standing.id) {
            continue;
        }
        standing.armies = None;
        if let Some(owner_visible) = &owner_visible {
            if !owner_visible.contains(&standing.id) {
                standing.owner = None;
            }
        }
    }
    view
}
