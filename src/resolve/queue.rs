//! Fairness queue for attack/transfer moves.
//!
//! Both players' ordered move lists are interleaved one move at a time so
//! neither side can spend contested armies before the other acts. A move
//! that resolves as illegal does not use up its player's turn: the same
//! player supplies the next move.

use std::collections::VecDeque;

use rand::Rng;

use crate::board::MoveOrder;
use crate::moves::Move;

/// Index of a player within a match (0 or 1).
pub type Slot = usize;

/// Interleaves two players' moves according to a [`MoveOrder`].
#[derive(Debug, Clone)]
pub struct MoveQueue {
    lanes: [VecDeque<Move>; 2],
    order: MoveOrder,
    round_leader: Slot,
    pair_leader: Slot,
    second_of_pair: bool,
    repeat: Option<Slot>,
}

impl MoveQueue {
    /// Creates an empty queue. Under [`MoveOrder::Cycle`], `round_leader`
    /// moves first in every pair.
    pub fn new(order: MoveOrder, round_leader: Slot) -> Self {
        MoveQueue {
            lanes: [VecDeque::new(), VecDeque::new()],
            order,
            round_leader: round_leader.min(1),
            pair_leader: round_leader.min(1),
            second_of_pair: false,
            repeat: None,
        }
    }

    pub fn extend(&mut self, slot: Slot, moves: impl IntoIterator<Item = Move>) {
        self.lanes[slot.min(1)].extend(moves);
    }

    pub fn len(&self) -> usize {
        self.lanes[0].len() + self.lanes[1].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dequeues the next move and the slot of the player who submitted it.
    pub fn next_move<R: Rng>(&mut self, rng: &mut R) -> Option<(Slot, Move)> {
        if self.is_empty() {
            return None;
        }

        let preferred = match self.repeat {
            Some(slot) => slot,
            None if self.second_of_pair => 1 - self.pair_leader,
            None => {
                self.pair_leader = match self.order {
                    MoveOrder::Cycle => self.round_leader,
                    MoveOrder::Random if self.lanes.iter().all(|l| !l.is_empty()) => {
                        usize::from(rng.gen::<bool>())
                    }
                    MoveOrder::Random => self.round_leader,
                };
                self.pair_leader
            }
        };

        let slot = if self.lanes[preferred].is_empty() {
            1 - preferred
        } else {
            preferred
        };
        self.lanes[slot].pop_front().map(|mv| (slot, mv))
    }

    /// Reports how the last dequeued move resolved.
    pub fn record_outcome(&mut self, slot: Slot, legal: bool) {
        if legal {
            self.repeat = None;
            self.second_of_pair = !self.second_of_pair;
        } else {
            self.repeat = Some(slot);
        }
    }
}
