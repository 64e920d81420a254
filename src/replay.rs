//! Replay record.
//!
//! Collects everything needed to re-watch a match: the setup, the draft,
//! every resolved move with the full standings right after it, the outcome
//! and each bot's error log. Written as a single JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::board::{Map, MapView, RegionId};
use crate::moves::Move;
use crate::protocol::json::{standings, StandingJson};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to write replay {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize replay: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How a finished match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Winner(String),
    Draw,
}

/// One move and the unfogged map right after it.
#[derive(Debug, Clone, Serialize)]
pub struct MoveRecord {
    #[serde(rename = "move")]
    pub text: String,
    pub standings: Vec<StandingJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    pub moves: Vec<MoveRecord>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Replay {
    pub map: String,
    pub players: Vec<String>,
    pub wastelands: Vec<RegionId>,
    pub pickable: Vec<RegionId>,
    pub starting_regions: BTreeMap<String, Vec<RegionId>>,
    /// Standings once the draft is over.
    pub initial_standings: Vec<StandingJson>,
    pub rounds: Vec<RoundRecord>,
    pub outcome: Option<MatchOutcome>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl Replay {
    pub fn new(map_name: &str, players: [&str; 2]) -> Self {
        Replay {
            map: map_name.to_string(),
            players: players.iter().map(|p| p.to_string()).collect(),
            ..Replay::default()
        }
    }

    pub fn start_round(&mut self, round: u32) {
        self.rounds.push(RoundRecord {
            round,
            moves: Vec::new(),
        });
    }

    /// Appends `mv` to the current round with a snapshot of `map`.
    pub fn record_move(&mut self, mv: &Move, map: &Map) {
        let record = MoveRecord {
            text: mv.to_string(),
            standings: standings(&MapView::full(map)),
        };
        if let Some(round) = self.rounds.last_mut() {
            round.moves.push(record);
        }
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ReplayError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::tests::{give, sample_map};

    #[test]
    fn moves_carry_standings_snapshot() {
        let mut map = sample_map();
        give(&mut map, 1, "bot1", 3);
        let mut replay = Replay::new("sample", ["bot1", "bot2"]);
        replay.start_round(1);
        replay.record_move(&Move::deploy("bot1", 1, 2), &map);

        let round = &replay.rounds[0];
        assert_eq!(round.moves[0].text, "bot1 place_armies 1 2");
        assert_eq!(round.moves[0].standings.len(), 6);
        assert_eq!(round.moves[0].standings[0].owned_by, "bot1");
    }

    #[test]
    fn moves_before_first_round_are_ignored() {
        let map = sample_map();
        let mut replay = Replay::new("sample", ["bot1", "bot2"]);
        replay.record_move(&Move::deploy("bot1", 1, 2), &map);
        assert!(replay.rounds.is_empty());
    }

    #[test]
    fn written_replay_is_json() {
        let mut replay = Replay::new("sample", ["bot1", "bot2"]);
        replay.outcome = Some(MatchOutcome::Winner("bot2".to_string()));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");
        replay.write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["map"], "sample");
        assert_eq!(value["outcome"]["Winner"], "bot2");
    }
}
