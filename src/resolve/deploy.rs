//! Army income and deploy resolution.

use crate::board::{Map, Settings};
use crate::moves::{Move, Order};

use super::RoundLog;

/// Armies `player` may place this round: base income plus the reward of
/// every bonus the player fully owns.
pub fn income(map: &Map, settings: &Settings, player: &str) -> u32 {
    settings.base_armies_per_turn + map.bonus_income(player)
}

/// Checks a player's deploys in submission order against the live map,
/// capping each to what is left of `armies_left` and marking the rest
/// illegal. The budget is spent as a side effect.
pub fn validate_deploys(map: &Map, player: &str, moves: &mut [Move], armies_left: &mut u32) {
    for mv in moves.iter_mut() {
        let Order::Deploy { region, armies } = mv.order else {
            mv.mark_illegal("attack/transfer submitted as a deploy");
            continue;
        };

        match map.region(region) {
            None => mv.mark_illegal(format!("place_armies for non-existing region {}", region)),
            Some(r) if !r.is_owned_by(player) => {
                mv.mark_illegal(format!("{} place_armies not owned", region))
            }
            Some(_) if armies < 1 => mv.mark_illegal("place_armies cannot place less than 1 army"),
            Some(_) if *armies_left == 0 => mv.mark_illegal("place_armies no armies left to place"),
            Some(_) => {
                let placed = armies.min(*armies_left);
                mv.set_armies(placed);
                *armies_left -= placed;
            }
        }
    }
}

/// Applies deploys in order. Every move, legal or not, is recorded in the
/// round log and shown to the opponent if it can see the target region.
/// `on_move` observes the map after each move.
pub fn execute_deploys(
    map: &mut Map,
    moves: Vec<Move>,
    players: [&str; 2],
    log: &mut RoundLog,
    on_move: &mut dyn FnMut(&Move, &Map),
) {
    for mv in moves {
        let Order::Deploy { region, armies } = mv.order else {
            continue;
        };
        if mv.is_legal() {
            if let Some(target) = map.region_mut(region) {
                target.armies += armies;
            }
        }

        for (slot, name) in players.iter().enumerate() {
            if mv.player != *name && map.visible_regions(name).contains(&region) {
                log.observed[slot].push(mv.clone());
            }
        }
        on_move(&mv, map);
        log.resolved.push(mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::tests::{give, sample_map};
    use crate::moves::Legality;

    fn setup() -> Map {
        let mut map = sample_map();
        give(&mut map, 1, "bot1", 3);
        give(&mut map, 3, "bot2", 3);
        map
    }

    #[test]
    fn income_adds_owned_bonuses() {
        let mut map = setup();
        let settings = Settings::default();
        assert_eq!(income(&map, &settings, "bot1"), 5);
        give(&mut map, 2, "bot1", 1);
        give(&mut map, 3, "bot1", 1);
        assert_eq!(income(&map, &settings, "bot1"), 7);
    }

    #[test]
    fn deploys_are_capped_to_budget() {
        let map = setup();
        let mut moves = vec![
            Move::deploy("bot1", 1, 3),
            Move::deploy("bot1", 1, 4),
            Move::deploy("bot1", 1, 1),
        ];
        let mut left = 5;
        validate_deploys(&map, "bot1", &mut moves, &mut left);
        assert_eq!(left, 0);
        assert_eq!(moves[0].armies(), 3);
        assert_eq!(moves[1].armies(), 2);
        assert!(moves[1].is_legal());
        assert_eq!(
            moves[2].legality,
            Legality::Illegal("place_armies no armies left to place".to_string())
        );
        let placed: u32 = moves.iter().filter(|m| m.is_legal()).map(Move::armies).sum();
        assert!(placed <= 5);
    }

    #[test]
    fn deploy_legality_checks() {
        let map = setup();
        let mut moves = vec![
            Move::deploy("bot1", 42, 1),
            Move::deploy("bot1", 3, 1),
            Move::deploy("bot1", 1, 0),
            Move::attack_transfer("bot1", 1, 2, 1),
        ];
        let mut left = 5;
        validate_deploys(&map, "bot1", &mut moves, &mut left);
        assert!(moves.iter().all(|m| !m.is_legal()));
        assert_eq!(left, 5);
        assert_eq!(moves[1].to_string(), "bot1 illegal_move 3 place_armies not owned");
    }

    #[test]
    fn execution_adds_armies_and_logs_visibility() {
        let mut map = setup();
        let moves = vec![Move::deploy("bot1", 1, 2), Move::deploy("bot2", 3, 4)];
        let mut log = RoundLog::default();
        let mut seen = 0;
        execute_deploys(&mut map, moves, ["bot1", "bot2"], &mut log, &mut |_, _| seen += 1);

        assert_eq!(map.region(1).unwrap().armies, 5);
        assert_eq!(map.region(3).unwrap().armies, 7);
        assert_eq!(seen, 2);
        assert_eq!(log.resolved.len(), 2);
        // 1 and 3 are not adjacent and nobody is shown its own deploy
        assert!(log.observed[0].is_empty());
        assert!(log.observed[1].is_empty());
    }

    #[test]
    fn adjacent_deploy_is_observed_by_opponent() {
        let mut map = setup();
        give(&mut map, 2, "bot2", 1);
        let moves = vec![Move::deploy("bot2", 2, 1)];
        let mut log = RoundLog::default();
        execute_deploys(&mut map, moves, ["bot1", "bot2"], &mut log, &mut |_, _| {});
        assert_eq!(log.observed[0].len(), 1);
        assert_eq!(log.observed[0][0].player, "bot2");
        assert!(log.observed[1].is_empty());
    }

    #[test]
    fn illegal_deploys_are_logged_but_not_applied() {
        let mut map = setup();
        let mut mv = Move::deploy("bot1", 1, 2);
        mv.mark_illegal("test");
        let mut log = RoundLog::default();
        execute_deploys(&mut map, vec![mv], ["bot1", "bot2"], &mut log, &mut |_, _| {});
        assert_eq!(map.region(1).unwrap().armies, 3);
        assert_eq!(log.resolved.len(), 1);
    }
}
