//! Region and super-region (bonus) definitions.
//!
//! A region is the atomic ownable territory. Its identity (id, name,
//! neighbors) is fixed when the map is loaded; its owner and army count are
//! mutated in place by the referee for the rest of the match.

use std::collections::BTreeSet;
use std::fmt;

/// Externally assigned region id, stable for the whole match.
pub type RegionId = u32;

/// Externally assigned super-region id.
pub type BonusId = u32;

/// Owner name reported for neutral regions.
pub const OWNER_NEUTRAL: &str = "neutral";

/// Owner name reported when fog hides the owner of a region.
pub const OWNER_FOG: &str = "fog";

/// Who holds a region on the live map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Neutral,
    Player(String),
}

impl Owner {
    /// Returns the owner name as used on the wire and in move logs.
    pub fn name(&self) -> &str {
        match self {
            Owner::Neutral => OWNER_NEUTRAL,
            Owner::Player(name) => name,
        }
    }

    /// Returns true if this owner is the player with the given name.
    pub fn is_player(&self, player: &str) -> bool {
        matches!(self, Owner::Player(name) if name == player)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A territory node in the map graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub neighbors: BTreeSet<RegionId>,
    pub armies: u32,
    pub owner: Owner,
}

impl Region {
    /// Creates a neutral region with no armies.
    pub fn new(id: RegionId, name: impl Into<String>, neighbors: BTreeSet<RegionId>) -> Self {
        Region {
            id,
            name: name.into(),
            neighbors,
            armies: 0,
            owner: Owner::Neutral,
        }
    }

    pub fn is_neighbor(&self, other: RegionId) -> bool {
        self.neighbors.contains(&other)
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.is_player(player)
    }

    pub fn is_neutral(&self) -> bool {
        self.owner == Owner::Neutral
    }
}

/// A named group of regions granting an army bonus when fully owned.
///
/// Ownership is never stored; see [`crate::board::Map::super_region_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperRegion {
    pub id: BonusId,
    pub name: String,
    pub reward: u32,
    pub regions: BTreeSet<RegionId>,
}

impl SuperRegion {
    pub fn new(id: BonusId, name: impl Into<String>, reward: u32, regions: BTreeSet<RegionId>) -> Self {
        SuperRegion {
            id,
            name: name.into(),
            reward,
            regions,
        }
    }

    pub fn contains(&self, region: RegionId) -> bool {
        self.regions.contains(&region)
    }
}
