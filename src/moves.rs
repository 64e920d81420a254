//! Move model.
//!
//! A move is either a deploy (place armies on an owned region) or an
//! attack/transfer (send armies to a neighbor). Moves are created from bot
//! replies each round, annotated with a legality verdict by the resolution
//! step, and kept in the round log whether or not they were executed.

use std::fmt;

use crate::board::RegionId;

/// The two order kinds a bot can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// `place_armies <region> <armies>`
    Deploy { region: RegionId, armies: u32 },

    /// `attack/transfer <from> <to> <armies>`
    AttackTransfer {
        from: RegionId,
        to: RegionId,
        armies: u32,
    },
}

/// Verdict attached to a move by the resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Legality {
    #[default]
    Legal,
    Illegal(String),
}

/// A player's order together with its legality annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub player: String,
    pub order: Order,
    pub legality: Legality,
}

impl Move {
    pub fn deploy(player: impl Into<String>, region: RegionId, armies: u32) -> Self {
        Move {
            player: player.into(),
            order: Order::Deploy { region, armies },
            legality: Legality::Legal,
        }
    }

    pub fn attack_transfer(player: impl Into<String>, from: RegionId, to: RegionId, armies: u32) -> Self {
        Move {
            player: player.into(),
            order: Order::AttackTransfer { from, to, armies },
            legality: Legality::Legal,
        }
    }

    pub fn is_legal(&self) -> bool {
        self.legality == Legality::Legal
    }

    pub fn is_deploy(&self) -> bool {
        matches!(self.order, Order::Deploy { .. })
    }

    pub fn is_attack_transfer(&self) -> bool {
        matches!(self.order, Order::AttackTransfer { .. })
    }

    /// Marks the move illegal. A move is never executed once marked.
    pub fn mark_illegal(&mut self, reason: impl Into<String>) {
        self.legality = Legality::Illegal(reason.into());
    }

    pub fn armies(&self) -> u32 {
        match self.order {
            Order::Deploy { armies, .. } | Order::AttackTransfer { armies, .. } => armies,
        }
    }

    /// Replaces the army count, used when a request is capped.
    pub fn set_armies(&mut self, value: u32) {
        match &mut self.order {
            Order::Deploy { armies, .. } | Order::AttackTransfer { armies, .. } => *armies = value,
        }
    }

    /// Regions named by the move: the deploy target, or source and destination.
    pub fn regions(&self) -> (RegionId, Option<RegionId>) {
        match self.order {
            Order::Deploy { region, .. } => (region, None),
            Order::AttackTransfer { from, to, .. } => (from, Some(to)),
        }
    }
}

impl fmt::Display for Move {
    /// Canonical wire text. Illegal moves render as
    /// `<player> illegal_move <reason>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Legality::Illegal(reason) = &self.legality {
            return write!(f, "{} illegal_move {}", self.player, reason);
        }
        match self.order {
            Order::Deploy { region, armies } => {
                write!(f, "{} place_armies {} {}", self.player, region, armies)
            }
            Order::AttackTransfer { from, to, armies } => {
                write!(f, "{} attack/transfer {} {} {}", self.player, from, to, armies)
            }
        }
    }
}
