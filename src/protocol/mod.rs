//! Bot protocol codecs.
//!
//! A [`BotProtocol`] turns referee events (settings, map, draft, round start,
//! move requests) into protocol lines for one player, and parses that
//! player's replies. Two variants exist: [`V1Protocol`], which embeds JSON
//! payloads, and [`LegacyProtocol`], the space-token format of the original
//! competition server. The referee is generic over the codec, so the variant
//! is fixed when the match is built.

pub mod json;
pub mod legacy;
pub mod parser;
pub mod v1;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

use crate::board::{Map, MapView, RegionId};
use crate::bot::Player;
use crate::moves::Move;

pub use json::{standings_json, StandingJson, Visibility};
pub use legacy::LegacyProtocol;
pub use parser::{parse_move, parse_moves, parse_picks, ParseError};
pub use v1::V1Protocol;

/// A game configuration the chosen protocol cannot express.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("{setting} must be {required} for the legacy protocol, got {actual}")]
    UnsupportedSetting {
        setting: &'static str,
        required: String,
        actual: String,
    },

    #[error("the legacy protocol does not support regions in more than one bonus")]
    OverlappingBonuses,

    #[error("the legacy protocol requires every region to belong to a bonus")]
    RegionWithoutBonus,
}

/// The command word of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    PlaceArmies,
    AttackTransfer,
}

impl Prompt {
    pub fn as_str(self) -> &'static str {
        match self {
            Prompt::PlaceArmies => "place_armies",
            Prompt::AttackTransfer => "attack/transfer",
        }
    }

    fn accepts(self, mv: &Move) -> bool {
        match self {
            Prompt::PlaceArmies => mv.is_deploy(),
            Prompt::AttackTransfer => mv.is_attack_transfer(),
        }
    }
}

/// Serializes referee events for one protocol variant.
///
/// Every method talks to a single player; the referee calls them once per
/// player. Methods take `&self` so both players can be served in parallel.
pub trait BotProtocol: Sync {
    /// Game-level settings and both player names.
    fn send_settings(&self, player: &mut Player, opponent: &str, max_rounds: u32);

    /// The static map: regions, bonuses, adjacency and wastelands.
    fn send_map(&self, player: &mut Player, map: &Map, wastelands: &BTreeSet<RegionId>);

    /// Offers `pickable` and returns the player's preferred regions, best
    /// first, at most `2 * quota` of them.
    fn request_picks(
        &self,
        player: &mut Player,
        quota: usize,
        pickable: &BTreeSet<RegionId>,
    ) -> Vec<RegionId>;

    /// Round start: armies to place, the fogged map and the moves this
    /// player saw during the previous round.
    fn send_round_start(&self, player: &mut Player, view: &MapView, observed: &[Move]);

    /// Maximum moves kept from one reply.
    fn max_moves(&self) -> usize;

    fn request_deploys(&self, player: &mut Player) -> Vec<Move> {
        request_moves(player, Prompt::PlaceArmies, self.max_moves())
    }

    fn request_attacks(&self, player: &mut Player) -> Vec<Move> {
        request_moves(player, Prompt::AttackTransfer, self.max_moves())
    }
}

/// Sends `go <prompt> <timebank>` and parses the reply, keeping only moves
/// of the requested kind.
pub fn request_moves(player: &mut Player, prompt: Prompt, max_moves: usize) -> Vec<Move> {
    let line = format!("go {} {}", prompt.as_str(), player.time_bank());
    player.send(&line);
    let reply = player.request();
    let name = player.name().to_string();
    parse_moves(&reply, &name, max_moves)
        .into_iter()
        .filter(|mv| {
            let keep = prompt.accepts(mv);
            if !keep {
                warn!(player = %name, %mv, "move does not answer a {} request, dropped", prompt.as_str());
            }
            keep
        })
        .collect()
}

/// `settings starting_armies <n>`, shared by both variants.
fn send_starting_armies(player: &mut Player) {
    let line = format!("settings starting_armies {}", player.armies_left);
    player.send(&line);
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a RegionId>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<keyword> <move> <move> ...`, or the bare keyword when there are none.
fn moves_line<'a>(keyword: &str, moves: impl IntoIterator<Item = &'a Move>) -> String {
    let mut line = keyword.to_string();
    for mv in moves {
        line.push(' ');
        line.push_str(&mv.to_string());
    }
    line
}
