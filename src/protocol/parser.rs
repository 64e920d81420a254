//! Bot reply parser.
//!
//! Parses the comma-separated move lists and the space-separated pick lists
//! bots send back. Malformed entries are reported as [`ParseError`]s, logged
//! and dropped; they never abort a round.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

use crate::board::RegionId;
use crate::moves::Move;

/// A reply fragment that could not be turned into a move or pick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("incorrect player name [{found}] or move format incorrect: [{input}]")]
    WrongPlayer { found: String, input: String },

    #[error("move format incorrect: [{0}]")]
    UnknownMove(String),

    #[error("wrong number of tokens in [{0}]")]
    TokenCount(String),

    #[error("non-integer value of [{what}] : [{value}]")]
    NotAnInteger { what: &'static str, value: String },

    #[error("picked region id is not an integer: [{0}]")]
    BadPick(String),
}

/// Parses one move: `<player> place_armies <region> <armies>` or
/// `<player> attack/transfer <from> <to> <armies>`.
///
/// Negative army counts parse as zero so that the legality check reports
/// them instead of the parser.
pub fn parse_move(input: &str, player: &str) -> Result<Move, ParseError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Err(ParseError::TokenCount(input.to_string()));
    };
    if first != player {
        return Err(ParseError::WrongPlayer {
            found: first.to_string(),
            input: input.trim().to_string(),
        });
    }

    match tokens.get(1).copied() {
        Some("place_armies") => {
            if tokens.len() != 4 {
                return Err(ParseError::TokenCount(input.trim().to_string()));
            }
            let region = parse_region(tokens[2], "region")?;
            let armies = parse_armies(tokens[3])?;
            Ok(Move::deploy(player, region, armies))
        }
        Some("attack/transfer") => {
            if tokens.len() != 5 {
                return Err(ParseError::TokenCount(input.trim().to_string()));
            }
            let from = parse_region(tokens[2], "from region")?;
            let to = parse_region(tokens[3], "to region")?;
            let armies = parse_armies(tokens[4])?;
            Ok(Move::attack_transfer(player, from, to, armies))
        }
        _ => Err(ParseError::UnknownMove(input.trim().to_string())),
    }
}

/// Parses a full reply, keeping at most `max_moves` entries. Bad entries
/// are logged and skipped.
pub fn parse_moves(input: &str, player: &str, max_moves: usize) -> Vec<Move> {
    let input = input.trim();
    if input.len() <= 1 {
        return Vec::new();
    }

    let mut moves = Vec::new();
    for (i, entry) in input.split(',').enumerate() {
        if i >= max_moves {
            warn!(player, max_moves, "maximum number of moves reached, ignoring the rest");
            break;
        }
        match parse_move(entry, player) {
            Ok(mv) => moves.push(mv),
            Err(e) => warn!(player, "{}", e),
        }
    }
    moves
}

/// Parses a pick reply: up to `max_picks` region ids, in preference order.
///
/// Ids outside `offered` and repeated ids are skipped. A token that is not
/// an integer discards the whole reply.
pub fn parse_picks(
    input: &str,
    offered: &BTreeSet<RegionId>,
    max_picks: usize,
) -> Result<Vec<RegionId>, ParseError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.len() > max_picks {
        warn!(max_picks, count = tokens.len(), "pick reply has too many picks");
    }

    let mut picks = Vec::new();
    for token in tokens.iter().take(max_picks) {
        let id: i64 = token
            .parse()
            .map_err(|_| ParseError::BadPick(token.to_string()))?;
        match RegionId::try_from(id) {
            Ok(id) if offered.contains(&id) => {
                if picks.contains(&id) {
                    warn!(region = id, "region is picked more than once");
                } else {
                    picks.push(id);
                }
            }
            _ => warn!(region = id, "picked region is not in the set of available picks"),
        }
    }
    Ok(picks)
}

fn parse_region(token: &str, what: &'static str) -> Result<RegionId, ParseError> {
    token.parse().map_err(|_| ParseError::NotAnInteger {
        what,
        value: token.to_string(),
    })
}

fn parse_armies(token: &str) -> Result<u32, ParseError> {
    let value: i64 = token.parse().map_err(|_| ParseError::NotAnInteger {
        what: "armies",
        value: token.to_string(),
    })?;
    Ok(value.clamp(0, i64::from(u32::MAX)) as u32)
}
