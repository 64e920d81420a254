//! Starting-region draft.
//!
//! Regions are handed out in the A BB AA BB ... pattern: the first-pick
//! player takes one region, then the players alternate taking up to two
//! until both have their quota. Each player's preference list is consumed
//! in order; a preference that is no longer neutral is skipped, and an
//! exhausted list falls back to a random still-neutral pickable region.

use std::collections::BTreeSet;

use rand::seq::IteratorRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::board::{Map, Owner, RegionId};
use crate::resolve::Slot;

/// Draft parameters that do not change between picks.
#[derive(Debug, Clone)]
pub struct DraftRules<'a> {
    pub pickable: &'a BTreeSet<RegionId>,
    /// Regions each player receives.
    pub quota: usize,
    /// Armies placed on every drafted region.
    pub player_armies: u32,
    /// Armies placed on pickable regions nobody drafted.
    pub leftover_armies: u32,
}

/// Assigns starting regions on `map` and returns them per player slot, in
/// award order.
pub fn assign_starting_regions<R: Rng>(
    map: &mut Map,
    players: [&str; 2],
    preferences: [Vec<RegionId>; 2],
    first_pick: Slot,
    rules: &DraftRules<'_>,
    rng: &mut R,
) -> [Vec<RegionId>; 2] {
    let second_pick = 1 - first_pick;
    let mut wishes = preferences.map(|list| list.into_iter());
    let mut awarded: [Vec<RegionId>; 2] = [Vec::new(), Vec::new()];
    let remaining = |awarded: &[Vec<RegionId>; 2], slot: Slot| rules.quota.saturating_sub(awarded[slot].len());

    let mut iteration = 0;
    while remaining(&awarded, 0) > 0 || remaining(&awarded, 1) > 0 {
        let slot = if remaining(&awarded, second_pick) == 0
            || (iteration % 2 == 0 && remaining(&awarded, first_pick) > 0)
        {
            first_pick
        } else {
            second_pick
        };
        let picks = if iteration == 0 {
            1
        } else {
            remaining(&awarded, slot).min(2)
        };

        for _ in 0..picks {
            let choice = wishes[slot]
                .by_ref()
                .find(|id| map.region(*id).is_some_and(|r| r.is_neutral()))
                .or_else(|| random_neutral(map, rules.pickable, rng));
            let Some(id) = choice else {
                warn!(player = players[slot], "no neutral starting region left to assign");
                return awarded;
            };
            if let Some(region) = map.region_mut(id) {
                region.owner = Owner::Player(players[slot].to_string());
                region.armies = rules.player_armies;
            }
            info!(player = players[slot], region = id, "starting region assigned");
            awarded[slot].push(id);
        }
        iteration += 1;
    }

    for &id in rules.pickable {
        if let Some(region) = map.region_mut(id) {
            if region.is_neutral() {
                region.armies = rules.leftover_armies;
            }
        }
    }
    awarded
}

fn random_neutral<R: Rng>(map: &Map, pickable: &BTreeSet<RegionId>, rng: &mut R) -> Option<RegionId> {
    pickable
        .iter()
        .copied()
        .filter(|id| map.region(*id).is_some_and(|r| r.is_neutral()))
        .choose(rng)
}
