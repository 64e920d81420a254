//! The legacy space-token protocol.
//!
//! Maps are sent as flat id lists, picks are drafted one region per request
//! with the player's own earlier picks removed from the offer, and only the
//! opponent's moves are reported back. The format cannot describe every game
//! the referee can run, so construction checks the settings and map first.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::board::{Map, MapView, RegionId, Settings};
use crate::bot::Player;
use crate::moves::Move;

use super::parser::parse_picks;
use super::{join_ids, moves_line, send_starting_armies, BotProtocol, ProtocolError};

const NEUTRAL_ARMIES: u32 = 2;
const WASTELAND_SIZE: u32 = 6;
const OFFENSIVE_KILL_RATE: f64 = 60.0;
const DEFENSIVE_KILL_RATE: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct LegacyProtocol {
    max_time_bank: u64,
    time_per_move: u64,
    max_moves: usize,
}

impl LegacyProtocol {
    /// Fails when `settings` or `map` use something the format cannot carry.
    pub fn new(settings: &Settings, map: &Map) -> Result<Self, ProtocolError> {
        if settings.neutral_armies != NEUTRAL_ARMIES {
            return Err(unsupported(
                "InitialNonDistributionArmies",
                NEUTRAL_ARMIES,
                settings.neutral_armies,
            ));
        }
        if settings.wastelands.wasteland_size != WASTELAND_SIZE {
            return Err(unsupported(
                "WastelandSize",
                WASTELAND_SIZE,
                settings.wastelands.wasteland_size,
            ));
        }
        if (settings.offensive_kill_rate - OFFENSIVE_KILL_RATE).abs() > f64::EPSILON {
            return Err(unsupported(
                "OffensiveKillRate",
                OFFENSIVE_KILL_RATE,
                settings.offensive_kill_rate,
            ));
        }
        if (settings.defensive_kill_rate - DEFENSIVE_KILL_RATE).abs() > f64::EPSILON {
            return Err(unsupported(
                "DefensiveKillRate",
                DEFENSIVE_KILL_RATE,
                settings.defensive_kill_rate,
            ));
        }
        if map.has_overlapping_bonuses() {
            return Err(ProtocolError::OverlappingBonuses);
        }
        if map.has_regions_without_bonus() {
            return Err(ProtocolError::RegionWithoutBonus);
        }

        Ok(LegacyProtocol {
            max_time_bank: settings.max_time_bank,
            time_per_move: settings.time_per_move,
            max_moves: settings.max_moves_per_turn,
        })
    }
}

fn unsupported(
    setting: &'static str,
    required: impl ToString,
    actual: impl ToString,
) -> ProtocolError {
    ProtocolError::UnsupportedSetting {
        setting,
        required: required.to_string(),
        actual: actual.to_string(),
    }
}

impl BotProtocol for LegacyProtocol {
    fn send_settings(&self, player: &mut Player, opponent: &str, max_rounds: u32) {
        let name = player.name().to_string();
        let lines = [
            format!("settings timebank {}", self.max_time_bank),
            format!("settings time_per_move {}", self.time_per_move),
            format!("settings max_rounds {}", max_rounds),
            format!("settings your_bot {}", name),
            format!("settings opponent_bot {}", opponent),
        ];
        for line in &lines {
            player.send(line);
        }
    }

    fn send_map(&self, player: &mut Player, map: &Map, wastelands: &BTreeSet<RegionId>) {
        let mut line = String::from("setup_map super_regions");
        for bonus in map.super_regions() {
            line.push_str(&format!(" {} {}", bonus.id, bonus.reward));
        }
        player.send(&line);

        let mut line = String::from("setup_map regions");
        for region in map.regions() {
            // construction guarantees exactly one bonus per region
            if let Some(bonus) = map.bonuses_of(region.id).first() {
                line.push_str(&format!(" {} {}", region.id, bonus));
            }
        }
        player.send(&line);

        // Adjacency is sent one way only, from the smaller id.
        let mut line = String::from("setup_map neighbors");
        for region in map.regions() {
            let higher: Vec<String> = region
                .neighbors
                .iter()
                .filter(|&&n| n > region.id)
                .map(|n| n.to_string())
                .collect();
            if !higher.is_empty() {
                line.push_str(&format!(" {} {}", region.id, higher.join(",")));
            }
        }
        player.send(&line);

        let mut line = String::from("setup_map wastelands");
        for id in wastelands {
            line.push_str(&format!(" {}", id));
        }
        player.send(&line);
    }

    fn request_picks(
        &self,
        player: &mut Player,
        quota: usize,
        pickable: &BTreeSet<RegionId>,
    ) -> Vec<RegionId> {
        let max_picks = quota * 2;
        player.send(&format!("settings starting_regions {}", join_ids(pickable)));
        player.send(&format!("settings starting_pick_amount {}", max_picks));

        let mut remaining = pickable.clone();
        let mut picks = Vec::new();
        for _ in 0..max_picks {
            let line = format!("pick_starting_region {} {}", player.time_bank(), join_ids(&remaining));
            player.send(&line);
            let reply = player.request();
            match parse_picks(&reply, &remaining, max_picks) {
                Ok(picked) if picked.len() == 1 => {
                    remaining.remove(&picked[0]);
                    picks.push(picked[0]);
                }
                Ok(_) => warn!(
                    player = %player.name(),
                    "did not receive exactly one pick per turn as specified by the protocol"
                ),
                Err(e) => warn!(player = %player.name(), "{}", e),
            }
        }
        info!(player = %player.name(), ?picks, "legacy picks collected");
        picks
    }

    fn send_round_start(&self, player: &mut Player, view: &MapView, observed: &[Move]) {
        send_starting_armies(player);

        let mut line = String::from("update_map");
        for standing in view.iter().filter(|s| !s.is_fogged()) {
            line.push_str(&format!(
                " {} {} {}",
                standing.id,
                standing.owner_name(),
                standing.armies_or_unknown()
            ));
        }
        player.send(&line);

        let name = player.name().to_string();
        let line = moves_line(
            "opponent_moves",
            observed.iter().filter(|mv| mv.is_legal() && mv.player != name),
        );
        player.send(&line);
    }

    fn max_moves(&self) -> usize {
        self.max_moves
    }
}
