//! The map graph: regions, super-regions and the queries the referee runs
//! against them.
//!
//! Regions and super-regions are stored in `BTreeMap`s so that every
//! iteration (random sampling during setup, protocol output, replay
//! standings) happens in ascending id order and seeded matches replay
//! identically.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::region::{BonusId, Owner, Region, RegionId, SuperRegion};

/// Consistency violations detected when a map is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("region {0} is declared more than once")]
    DuplicateRegion(RegionId),

    #[error("bonus {0} is declared more than once")]
    DuplicateBonus(BonusId),

    #[error("region {0} is inaccessible (has no neighbouring regions)")]
    NoNeighbors(RegionId),

    #[error("region {region} neighbours a non-existing region {neighbor}")]
    UnknownNeighbor { region: RegionId, neighbor: RegionId },

    #[error("bonus {0} has no territories")]
    EmptyBonus(BonusId),

    #[error("bonus {bonus} contains a non-existing region {region}")]
    UnknownBonusRegion { bonus: BonusId, region: RegionId },

    #[error("map has no regions")]
    Empty,
}

/// The region/super-region graph with live ownership and army counts.
///
/// `Clone` is a deep copy; [`Map::snapshot`] is the name used where a
/// round-scoped baseline is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    name: String,
    regions: BTreeMap<RegionId, Region>,
    bonuses: BTreeMap<BonusId, SuperRegion>,
}

impl Map {
    /// Builds a map, validating that every neighbor and bonus member exists
    /// and that every region has at least one neighbor. Neighbor lists are
    /// made symmetric after validation.
    pub fn new(
        name: impl Into<String>,
        regions: Vec<Region>,
        bonuses: Vec<SuperRegion>,
    ) -> Result<Self, MapError> {
        if regions.is_empty() {
            return Err(MapError::Empty);
        }

        let mut region_map = BTreeMap::new();
        for region in regions {
            let id = region.id;
            if region_map.insert(id, region).is_some() {
                return Err(MapError::DuplicateRegion(id));
            }
        }

        let mut bonus_map = BTreeMap::new();
        for bonus in bonuses {
            let id = bonus.id;
            if bonus_map.insert(id, bonus).is_some() {
                return Err(MapError::DuplicateBonus(id));
            }
        }

        check_consistency(&region_map, &bonus_map)?;

        let mut map = Map {
            name: name.into(),
            regions: region_map,
            bonuses: bonus_map,
        };
        map.symmetrize();
        Ok(map)
    }

    /// Adds the reverse edge for every one-directional neighbor declaration.
    fn symmetrize(&mut self) {
        let edges: Vec<(RegionId, RegionId)> = self
            .regions
            .values()
            .flat_map(|r| r.neighbors.iter().map(move |&n| (n, r.id)))
            .collect();
        for (from, to) in edges {
            if let Some(region) = self.regions.get_mut(&from) {
                region.neighbors.insert(to);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an independent deep copy of the current standings.
    pub fn snapshot(&self) -> Map {
        self.clone()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    /// All regions in ascending id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn regions_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.values_mut()
    }

    pub fn region_ids(&self) -> BTreeSet<RegionId> {
        self.regions.keys().copied().collect()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    /// All super-regions in ascending id order.
    pub fn super_regions(&self) -> impl Iterator<Item = &SuperRegion> {
        self.bonuses.values()
    }

    pub fn super_region(&self, id: BonusId) -> Option<&SuperRegion> {
        self.bonuses.get(&id)
    }

    /// Ids of the regions owned by `player`.
    pub fn owned_regions(&self, player: &str) -> BTreeSet<RegionId> {
        self.regions
            .values()
            .filter(|r| r.is_owned_by(player))
            .map(|r| r.id)
            .collect()
    }

    pub fn owned_count(&self, player: &str) -> usize {
        self.regions.values().filter(|r| r.is_owned_by(player)).count()
    }

    /// Owned regions plus every neighbor of an owned region.
    pub fn visible_regions(&self, player: &str) -> BTreeSet<RegionId> {
        let mut visible = BTreeSet::new();
        for region in self.regions.values().filter(|r| r.is_owned_by(player)) {
            visible.insert(region.id);
            visible.extend(region.neighbors.iter().copied());
        }
        visible
    }

    /// The common owner of every member region, or `None` if ownership is
    /// mixed. A fully neutral bonus reports `Owner::Neutral`.
    pub fn super_region_owner(&self, bonus: &SuperRegion) -> Option<&Owner> {
        let mut owner: Option<&Owner> = None;
        for id in &bonus.regions {
            let region_owner = &self.regions.get(id)?.owner;
            match owner {
                None => owner = Some(region_owner),
                Some(o) if o != region_owner => return None,
                Some(_) => {}
            }
        }
        owner
    }

    /// Sum of the rewards of every bonus fully owned by `player`.
    pub fn bonus_income(&self, player: &str) -> u32 {
        self.bonuses
            .values()
            .filter(|b| matches!(self.super_region_owner(b), Some(o) if o.is_player(player)))
            .map(|b| b.reward)
            .sum()
    }

    /// Ids of the bonuses a region belongs to, ascending.
    pub fn bonuses_of(&self, region: RegionId) -> Vec<BonusId> {
        self.bonuses
            .values()
            .filter(|b| b.contains(region))
            .map(|b| b.id)
            .collect()
    }

    /// True if any region is a member of more than one bonus.
    pub fn has_overlapping_bonuses(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.bonuses
            .values()
            .flat_map(|b| b.regions.iter())
            .any(|id| !seen.insert(*id))
    }

    /// True if some region is not a member of any bonus.
    pub fn has_regions_without_bonus(&self) -> bool {
        self.regions
            .keys()
            .any(|id| !self.bonuses.values().any(|b| b.contains(*id)))
    }
}

fn check_consistency(
    regions: &BTreeMap<RegionId, Region>,
    bonuses: &BTreeMap<BonusId, SuperRegion>,
) -> Result<(), MapError> {
    for (&id, region) in regions {
        if region.neighbors.is_empty() {
            return Err(MapError::NoNeighbors(id));
        }
        if let Some(&neighbor) = region.neighbors.iter().find(|n| !regions.contains_key(n)) {
            return Err(MapError::UnknownNeighbor { region: id, neighbor });
        }
    }

    for (&id, bonus) in bonuses {
        if bonus.regions.is_empty() {
            return Err(MapError::EmptyBonus(id));
        }
        if let Some(&region) = bonus.regions.iter().find(|r| !regions.contains_key(r)) {
            return Err(MapError::UnknownBonusRegion { bonus: id, region });
        }
    }

    Ok(())
}
