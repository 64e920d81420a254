//! Match setup: neutral fill, wastelands and the pickable starting regions.
//!
//! Only the map-generation random source is used here.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{
    DistributionMode, Map, Owner, RegionId, Settings, SettingsError, OWNER_FOG, OWNER_NEUTRAL,
};

/// Players in a match.
pub const NUM_PLAYERS: usize = 2;

/// A configuration that cannot produce a playable match.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("not enough starting regions on this map: {available} pickable, {required} required")]
    NotEnoughStartingRegions { available: usize, required: usize },

    #[error("both players are named {0}")]
    DuplicatePlayerName(String),

    #[error("invalid player name {0:?}: {1}")]
    InvalidPlayerName(String, &'static str),
}

/// Rejects names that clash with the owner sentinels or cannot travel as a
/// single token of a move line.
pub fn check_player_name(name: &str) -> Result<(), SetupError> {
    let reason = if name.is_empty() {
        "empty"
    } else if name == OWNER_NEUTRAL || name == OWNER_FOG {
        "reserved owner name"
    } else if name.contains(|c: char| c.is_whitespace() || c == ',') {
        "contains whitespace or a comma"
    } else {
        return Ok(());
    };
    Err(SetupError::InvalidPlayerName(name.to_string(), reason))
}

/// Makes every region neutral with the configured army count.
pub fn place_neutrals(map: &mut Map, settings: &Settings) {
    for region in map.regions_mut() {
        region.owner = Owner::Neutral;
        region.armies = settings.neutral_armies;
    }
}

/// Raises randomly chosen regions to the wasteland size. At most
/// `regions - players` wastelands are placed, each region at most once.
pub fn place_wastelands<R: Rng>(map: &mut Map, settings: &Settings, rng: &mut R) -> BTreeSet<RegionId> {
    let ids: Vec<RegionId> = map.region_ids().into_iter().collect();
    let count = (settings.wastelands.number_of_wastelands as usize)
        .min(ids.len().saturating_sub(NUM_PLAYERS));

    let wastelands: BTreeSet<RegionId> = ids.choose_multiple(rng, count).copied().collect();
    for &id in &wastelands {
        if let Some(region) = map.region_mut(id) {
            region.armies = settings.wastelands.wasteland_size;
        }
    }
    debug!(?wastelands, "wastelands placed");
    wastelands
}

/// The regions offered in the draft. Wastelands are never pickable.
pub fn pickable_regions<R: Rng>(
    map: &Map,
    settings: &Settings,
    wastelands: &BTreeSet<RegionId>,
    rng: &mut R,
) -> Result<BTreeSet<RegionId>, SetupError> {
    let mut pickable = BTreeSet::new();
    match settings.distribution_mode {
        DistributionMode::RandomWarlords => {
            for bonus in map.super_regions() {
                let members: Vec<RegionId> = bonus.regions.iter().copied().collect();
                if let Some(&id) = members.choose(rng) {
                    if !wastelands.contains(&id) {
                        pickable.insert(id);
                    }
                }
            }
        }
        DistributionMode::RandomCities => {
            for bonus in map.super_regions() {
                let members: Vec<RegionId> = bonus.regions.iter().copied().collect();
                let excluded = members.choose(rng).copied();
                pickable.extend(
                    members
                        .into_iter()
                        .filter(|id| Some(*id) != excluded && !wastelands.contains(id)),
                );
            }
        }
        DistributionMode::Full => {
            pickable.extend(map.region_ids().difference(wastelands).copied());
        }
    }

    let required = NUM_PLAYERS * settings.starting_territories as usize;
    if pickable.len() < required {
        return Err(SetupError::NotEnoughStartingRegions {
            available: pickable.len(),
            required,
        });
    }
    info!(count = pickable.len(), "pickable starting regions selected");
    Ok(pickable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::tests::sample_map;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn settings(mode: DistributionMode, wastelands: u32, territories: u32) -> Settings {
        let mut settings = Settings {
            distribution_mode: mode,
            starting_territories: territories,
            ..Settings::default()
        };
        settings.wastelands.number_of_wastelands = wastelands;
        settings
    }

    #[test]
    fn player_names_must_be_single_plain_tokens() {
        assert!(check_player_name("bot1").is_ok());
        assert!(check_player_name("Mr_Bot-2").is_ok());
        for name in ["", "neutral", "fog", "my bot", "bot\t1", "a,b"] {
            assert!(
                matches!(check_player_name(name), Err(SetupError::InvalidPlayerName(..))),
                "{:?} accepted",
                name
            );
        }
    }

    #[test]
    fn neutrals_get_configured_armies() {
        let mut map = sample_map();
        place_neutrals(&mut map, &Settings::default());
        assert!(map.regions().all(|r| r.is_neutral() && r.armies == 2));
    }

    #[test]
    fn wasteland_count_is_capped() {
        for seed in 0..20 {
            let mut map = sample_map();
            let settings = settings(DistributionMode::Full, 50, 1);
            let wastelands = place_wastelands(&mut map, &settings, &mut SmallRng::seed_from_u64(seed));
            assert_eq!(wastelands.len(), 4);
            for id in &wastelands {
                assert_eq!(map.region(*id).unwrap().armies, 10);
            }
        }
    }

    #[test]
    fn configured_wasteland_count_is_used() {
        let mut map = sample_map();
        let settings = settings(DistributionMode::Full, 1, 1);
        let wastelands = place_wastelands(&mut map, &settings, &mut SmallRng::seed_from_u64(3));
        assert_eq!(wastelands.len(), 1);
    }

    #[test]
    fn warlords_offers_one_region_per_bonus() {
        let map = sample_map();
        let settings = settings(DistributionMode::RandomWarlords, 0, 1);
        let pickable =
            pickable_regions(&map, &settings, &BTreeSet::new(), &mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(pickable.len(), 2);
        assert_eq!(pickable.iter().filter(|&&id| id <= 3).count(), 1);
    }

    #[test]
    fn cities_offers_all_but_one_per_bonus() {
        let map = sample_map();
        let settings = settings(DistributionMode::RandomCities, 0, 2);
        let pickable =
            pickable_regions(&map, &settings, &BTreeSet::new(), &mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(pickable.len(), 4);
    }

    #[test]
    fn full_excludes_wastelands() {
        let map = sample_map();
        let settings = settings(DistributionMode::Full, 0, 2);
        let pickable = pickable_regions(
            &map,
            &settings,
            &BTreeSet::from([2, 5]),
            &mut SmallRng::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(pickable, BTreeSet::from([1, 3, 4, 6]));
    }

    #[test]
    fn too_few_pickable_regions_is_fatal() {
        let map = sample_map();
        let settings = settings(DistributionMode::RandomWarlords, 0, 2);
        let err = pickable_regions(&map, &settings, &BTreeSet::new(), &mut SmallRng::seed_from_u64(5))
            .unwrap_err();
        assert!(matches!(
            err,
            SetupError::NotEnoughStartingRegions {
                available: 2,
                required: 4
            }
        ));
    }
}
