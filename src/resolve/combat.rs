//! Combat resolution for a single attack.
//!
//! Expected casualties are `attackers x offensive ratio` defenders and
//! `defenders x defensive ratio` attackers. A non-zero luck modifier blends
//! those with a fully random roll (one Bernoulli draw per engaged army), and
//! the rounding mode turns the blended values into whole armies.

use rand::Rng;

use crate::board::{RoundingMode, Settings};

/// The subset of settings that drives combat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatParams {
    /// Probability that one attacking army destroys a defender.
    pub offensive_kill_ratio: f64,
    /// Probability that one defending army destroys an attacker.
    pub defensive_kill_ratio: f64,
    pub luck: f64,
    pub rounding: RoundingMode,
}

impl CombatParams {
    pub fn from_settings(settings: &Settings) -> Self {
        CombatParams {
            offensive_kill_ratio: settings.offensive_kill_ratio(),
            defensive_kill_ratio: settings.defensive_kill_ratio(),
            luck: settings.luck_modifier,
            rounding: settings.rounding_mode,
        }
    }
}

/// Raw casualty counts of one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Casualties {
    pub attackers_destroyed: u32,
    /// Never more than the defending stack.
    pub defenders_destroyed: u32,
}

/// How an attack ended once casualties are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// Every defender died; `survivors` attackers occupy the region.
    Captured { survivors: u32 },
    /// The region held. The defender kept at least one army.
    Repelled { attackers_lost: u32, defenders_lost: u32 },
}

/// Computes casualties for `attackers` armies attacking `defenders` armies.
///
/// Random draws happen in a fixed order (defender-loss rolls, attacker-loss
/// rolls, then rounding draws), so a seeded source reproduces results.
pub fn resolve_battle<R: Rng>(
    attackers: u32,
    defenders: u32,
    params: &CombatParams,
    rng: &mut R,
) -> Casualties {
    let mut defenders_destroyed = f64::from(attackers) * params.offensive_kill_ratio;
    let mut attackers_destroyed = f64::from(defenders) * params.defensive_kill_ratio;

    if params.luck > 0.0 {
        let luck = params.luck;
        let defender_roll = full_luck_kills(attackers, params.offensive_kill_ratio, rng);
        let attacker_roll = full_luck_kills(defenders, params.defensive_kill_ratio, rng);
        defenders_destroyed = defenders_destroyed * (1.0 - luck) + f64::from(defender_roll) * luck;
        attackers_destroyed = attackers_destroyed * (1.0 - luck) + f64::from(attacker_roll) * luck;
    }

    Casualties {
        defenders_destroyed: round_armies(defenders_destroyed, params.rounding, rng).min(defenders),
        attackers_destroyed: round_armies(attackers_destroyed, params.rounding, rng),
    }
}

/// Resolves an attack and applies the capture rule: the defender is wiped
/// out only if at least one attacker survives.
pub fn fight<R: Rng>(
    attacking: u32,
    defending: u32,
    params: &CombatParams,
    rng: &mut R,
) -> BattleOutcome {
    let casualties = resolve_battle(attacking, defending, params, rng);

    if casualties.attackers_destroyed >= attacking {
        return BattleOutcome::Repelled {
            attackers_lost: attacking,
            defenders_lost: casualties
                .defenders_destroyed
                .min(defending.saturating_sub(1)),
        };
    }

    if casualties.defenders_destroyed >= defending {
        BattleOutcome::Captured {
            survivors: attacking - casualties.attackers_destroyed,
        }
    } else {
        BattleOutcome::Repelled {
            attackers_lost: casualties.attackers_destroyed,
            defenders_lost: casualties.defenders_destroyed,
        }
    }
}

fn full_luck_kills<R: Rng>(armies: u32, ratio: f64, rng: &mut R) -> u32 {
    (0..armies).filter(|_| rng.gen::<f64>() < ratio).count() as u32
}

fn round_armies<R: Rng>(armies: f64, mode: RoundingMode, rng: &mut R) -> u32 {
    match mode {
        RoundingMode::Straight => armies.round() as u32,
        RoundingMode::WeightedRandom => {
            let floor = armies.floor();
            let remainder = armies - floor;
            if rng.gen::<f64>() < remainder {
                floor as u32 + 1
            } else {
                floor as u32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn no_luck() -> CombatParams {
        CombatParams {
            offensive_kill_ratio: 0.6,
            defensive_kill_ratio: 0.7,
            luck: 0.0,
            rounding: RoundingMode::Straight,
        }
    }

    #[test]
    fn no_luck_is_deterministic_rounding() {
        let mut rng = SmallRng::seed_from_u64(1);
        let result = resolve_battle(10, 20, &no_luck(), &mut rng);
        assert_eq!(result.defenders_destroyed, 6);
        assert_eq!(result.attackers_destroyed, 14);

        // 3 x 0.6 = 1.8, 2 x 0.7 = 1.4
        let result = resolve_battle(3, 2, &no_luck(), &mut rng);
        assert_eq!(result.defenders_destroyed, 2);
        assert_eq!(result.attackers_destroyed, 1);
    }

    #[test]
    fn defender_losses_clamped_to_stack() {
        let mut rng = SmallRng::seed_from_u64(1);
        let result = resolve_battle(10, 2, &no_luck(), &mut rng);
        assert_eq!(result.defenders_destroyed, 2);
    }

    #[test]
    fn full_luck_is_reproducible_with_a_seed() {
        let params = CombatParams {
            luck: 1.0,
            ..no_luck()
        };
        let a = resolve_battle(25, 17, &params, &mut SmallRng::seed_from_u64(99));
        let b = resolve_battle(25, 17, &params, &mut SmallRng::seed_from_u64(99));
        assert_eq!(a, b);
        assert!(a.defenders_destroyed <= 17);
        assert!(a.attackers_destroyed <= 17);
    }

    #[test]
    fn full_luck_attacker_losses_are_rolled() {
        // With a certain kill ratio every defender roll succeeds.
        let params = CombatParams {
            offensive_kill_ratio: 1.0,
            defensive_kill_ratio: 1.0,
            luck: 1.0,
            rounding: RoundingMode::Straight,
        };
        let result = resolve_battle(4, 3, &params, &mut SmallRng::seed_from_u64(5));
        assert_eq!(result.defenders_destroyed, 3);
        assert_eq!(result.attackers_destroyed, 3);
    }

    #[test]
    fn weighted_rounding_stays_within_floor_and_ceil() {
        let params = CombatParams {
            rounding: RoundingMode::WeightedRandom,
            ..no_luck()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            // 3 x 0.6 = 1.8, 5 x 0.7 = 3.5
            let result = resolve_battle(3, 5, &params, &mut rng);
            assert!((1..=2).contains(&result.defenders_destroyed));
            assert!((3..=4).contains(&result.attackers_destroyed));
        }
    }

    #[test]
    fn weighted_rounding_keeps_whole_values() {
        let params = CombatParams {
            offensive_kill_ratio: 0.5,
            defensive_kill_ratio: 0.25,
            luck: 0.0,
            rounding: RoundingMode::WeightedRandom,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let result = resolve_battle(8, 8, &params, &mut rng);
            assert_eq!(result.defenders_destroyed, 4);
            assert_eq!(result.attackers_destroyed, 2);
        }
    }

    #[test]
    fn overwhelming_attack_captures() {
        let mut rng = SmallRng::seed_from_u64(1);
        // 10 attackers kill 6 >= 2 defenders, lose round(1.4) = 1
        assert_eq!(
            fight(10, 2, &no_luck(), &mut rng),
            BattleOutcome::Captured { survivors: 9 }
        );
    }

    #[test]
    fn weak_attack_is_repelled() {
        let mut rng = SmallRng::seed_from_u64(1);
        // 3 attackers kill round(1.8) = 2 of 4, lose round(2.8) = 3
        assert_eq!(
            fight(3, 4, &no_luck(), &mut rng),
            BattleOutcome::Repelled { attackers_lost: 3, defenders_lost: 2 }
        );
    }

    #[test]
    fn wiped_out_attackers_never_capture() {
        let mut rng = SmallRng::seed_from_u64(1);
        // 2 attackers kill round(1.2) = 1 >= 1 defender, but lose round(0.7) = 1 of 2; capture
        assert_eq!(
            fight(2, 1, &no_luck(), &mut rng),
            BattleOutcome::Captured { survivors: 1 }
        );
        // 1 attacker kills round(0.6) = 1 defender, loses round(0.7) = 1; all dead, defender keeps 1
        assert_eq!(
            fight(1, 1, &no_luck(), &mut rng),
            BattleOutcome::Repelled { attackers_lost: 1, defenders_lost: 0 }
        );
    }

    #[test]
    fn params_from_settings_use_fractions() {
        let params = CombatParams::from_settings(&Settings::default());
        assert!((params.offensive_kill_ratio - 0.6).abs() < 1e-12);
        assert!((params.defensive_kill_ratio - 0.7).abs() < 1e-12);
        assert!((params.luck - 0.18).abs() < 1e-12);
        assert_eq!(params.rounding, RoundingMode::Straight);
    }
}
