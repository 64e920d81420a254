//! Attack/transfer validation and resolution.
//!
//! Moves are resolved one at a time in fairness-queue order against the
//! live map. A snapshot taken before the first move records how many armies
//! each region had when orders were issued; armies committed from a region
//! are deducted from the snapshot so that armies arriving mid-round cannot
//! be moved again in the same round.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::debug;

use crate::board::{Map, Owner, RegionId};
use crate::moves::{Move, Order};

use super::combat::{fight, BattleOutcome, CombatParams};
use super::queue::MoveQueue;
use super::RoundLog;

/// Queue-time checks against the live map: both regions exist, the source
/// is owned by the submitter, the destination is a neighbor and at least
/// one army is requested.
pub fn validate_attack(map: &Map, player: &str, mv: &mut Move) {
    let Order::AttackTransfer { from, to, armies } = mv.order else {
        mv.mark_illegal("deploy submitted as an attack/transfer");
        return;
    };

    let Some(source) = map.region(from) else {
        mv.mark_illegal(format!("attack/transfer from non-existing region {}", from));
        return;
    };
    if !map.contains(to) {
        mv.mark_illegal(format!("attack/transfer to non-existing region {}", to));
    } else if !source.is_owned_by(player) {
        mv.mark_illegal(format!("{} attack/transfer not owned", from));
    } else if !source.is_neighbor(to) {
        mv.mark_illegal(format!("{} attack/transfer not a neighbor", to));
    } else if armies < 1 {
        mv.mark_illegal("attack/transfer cannot use less than 1 army");
    }
}

/// Resolves every queued move. `players` maps queue slots to names.
pub fn resolve_attacks<R: Rng>(
    map: &mut Map,
    queue: &mut MoveQueue,
    players: [&str; 2],
    params: &CombatParams,
    rng: &mut R,
    log: &mut RoundLog,
    on_move: &mut dyn FnMut(&Move, &Map),
) {
    let mut round_start = map.snapshot();
    let mut previously_visible = players.map(|p| round_start.visible_regions(p));
    let mut used_pairs: BTreeSet<(RegionId, RegionId)> = BTreeSet::new();

    while let Some((slot, mut mv)) = queue.next_move(rng) {
        if mv.is_legal() {
            execute(map, &mut round_start, &mut used_pairs, &mut mv, params, rng);
        }

        let (from, to) = match mv.order {
            Order::AttackTransfer { from, to, .. } => (from, to),
            Order::Deploy { region, .. } => (region, region),
        };
        for (observer, name) in players.iter().enumerate() {
            let visible = map.visible_regions(name);
            if observer != slot
                && (visible.contains(&from)
                    || visible.contains(&to)
                    || previously_visible[observer].contains(&to))
            {
                log.observed[observer].push(mv.clone());
            }
            previously_visible[observer] = visible;
        }

        let legal = mv.is_legal();
        on_move(&mv, map);
        log.resolved.push(mv);
        queue.record_outcome(slot, legal);
    }
}

fn execute<R: Rng>(
    map: &mut Map,
    round_start: &mut Map,
    used_pairs: &mut BTreeSet<(RegionId, RegionId)>,
    mv: &mut Move,
    params: &CombatParams,
    rng: &mut R,
) {
    let Order::AttackTransfer { from, to, armies } = mv.order else {
        return;
    };
    let (Some(live_from), Some(live_to)) = (map.region(from), map.region(to)) else {
        mv.mark_illegal(format!("{} attack/transfer references a missing region", from));
        return;
    };
    let (Some(start_from), Some(start_to)) = (round_start.region(from), round_start.region(to)) else {
        mv.mark_illegal(format!("{} attack/transfer references a missing region", from));
        return;
    };

    if !live_from.is_owned_by(&mv.player) {
        mv.mark_illegal(format!("{} attack/transfer was taken this round", from));
        return;
    }
    if used_pairs.contains(&(from, to)) {
        mv.mark_illegal(format!(
            "{} attack/transfer has already attacked/transfered to this region",
            from
        ));
        return;
    }

    let available = start_from.armies;
    let live = live_from.armies;
    if available <= 1 {
        mv.mark_illegal(format!("{} attack/transfer has used all available armies", from));
        return;
    }

    let mut committed = armies;
    if available < live && available - 1 < committed {
        committed = available - 1;
    } else if available >= live && live.saturating_sub(1) < committed {
        committed = live.saturating_sub(1);
    }
    mv.set_armies(committed);

    let is_transfer = live_to.is_owned_by(&mv.player);
    let defending = live_to.armies;
    let start_to_armies = start_to.armies;

    if let Some(region) = round_start.region_mut(from) {
        region.armies -= committed;
    }

    if live <= 1 {
        let kind = if is_transfer { "transfer" } else { "attack" };
        mv.mark_illegal(format!("{} {} only has 1 army", from, kind));
        return;
    }

    if is_transfer {
        move_armies(map, from, to, committed);
        debug!(player = %mv.player, from, to, armies = committed, "transfer");
    } else {
        let attacking = committed.min(live - 1);
        match fight(attacking, defending, params, rng) {
            BattleOutcome::Captured { survivors } => {
                if let Some(region) = map.region_mut(from) {
                    region.armies -= attacking;
                }
                if let Some(region) = map.region_mut(to) {
                    region.owner = Owner::Player(mv.player.clone());
                    region.armies = survivors;
                }
                // A captured region cannot supply armies again this round.
                if let Some(region) = round_start.region_mut(to) {
                    region.armies = 1;
                }
                debug!(player = %mv.player, from, to, attacking, survivors, "region captured");
            }
            BattleOutcome::Repelled {
                attackers_lost,
                defenders_lost,
            } => {
                if let Some(region) = map.region_mut(from) {
                    region.armies -= attackers_lost;
                }
                if let Some(region) = map.region_mut(to) {
                    region.armies -= defenders_lost;
                }
                if let Some(region) = round_start.region_mut(to) {
                    region.armies = start_to_armies.saturating_sub(defenders_lost);
                }
                debug!(player = %mv.player, from, to, attackers_lost, defenders_lost, "attack repelled");
            }
        }
    }
    used_pairs.insert((from, to));
}

fn move_armies(map: &mut Map, from: RegionId, to: RegionId, armies: u32) {
    if let Some(region) = map.region_mut(from) {
        region.armies -= armies;
    }
    if let Some(region) = map.region_mut(to) {
        region.armies += armies;
    }
}
