//! Round resolution.
//!
//! Turns validated deploy and attack/transfer moves into map changes:
//! combat casualties, army income, the fairness queue that interleaves the
//! two players' attacks, and the per-player log of observed moves.

pub mod attack;
pub mod combat;
pub mod deploy;
pub mod queue;

pub use attack::{resolve_attacks, validate_attack};
pub use combat::{fight, resolve_battle, BattleOutcome, Casualties, CombatParams};
pub use deploy::{execute_deploys, income, validate_deploys};
pub use queue::{MoveQueue, Slot};

use crate::moves::Move;

/// Moves resolved during one phase.
#[derive(Debug, Clone, Default)]
pub struct RoundLog {
    /// Every move in execution order, legal or not.
    pub resolved: Vec<Move>,
    /// Per player slot, the opponent's moves that player could see.
    pub observed: [Vec<Move>; 2],
}

impl RoundLog {
    /// Appends another phase's log.
    pub fn append(&mut self, other: RoundLog) {
        self.resolved.extend(other.resolved);
        for (mine, theirs) in self.observed.iter_mut().zip(other.observed) {
            mine.extend(theirs);
        }
    }
}
