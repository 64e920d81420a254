//! The V1 protocol: JSON map and standings, all picks in one request, and
//! every visible legal move reported back, the player's own included.

use std::collections::BTreeSet;

use tracing::warn;

use crate::board::{map_to_json, Map, MapView, RegionId, Settings};
use crate::bot::Player;
use crate::moves::Move;

use super::parser::parse_picks;
use super::{join_ids, moves_line, send_starting_armies, standings_json, BotProtocol};

#[derive(Debug, Clone)]
pub struct V1Protocol {
    settings: Settings,
}

impl V1Protocol {
    pub fn new(settings: &Settings) -> Self {
        V1Protocol {
            settings: settings.clone(),
        }
    }
}

impl BotProtocol for V1Protocol {
    fn send_settings(&self, player: &mut Player, opponent: &str, max_rounds: u32) {
        let name = player.name().to_string();
        let lines = [
            format!("settings timebank {}", self.settings.max_time_bank),
            format!("settings time_per_move {}", self.settings.time_per_move),
            format!("settings max_rounds {}", max_rounds),
            format!("settings your_bot {}", name),
            format!("settings opponent_bot {}", opponent),
            format!("settings all_settings_json {}", self.settings.to_json_string()),
        ];
        for line in &lines {
            player.send(line);
        }
    }

    fn send_map(&self, player: &mut Player, map: &Map, _wastelands: &BTreeSet<RegionId>) {
        // Wastelands show up through their army counts in the first update_map.
        player.send(&format!("setup_map {}", map_to_json(map)));
    }

    fn request_picks(
        &self,
        player: &mut Player,
        quota: usize,
        pickable: &BTreeSet<RegionId>,
    ) -> Vec<RegionId> {
        let max_picks = quota * 2;
        player.send(&format!("settings starting_regions_amount {}", quota));
        player.send(&format!("settings maximum_number_of_picks {}", max_picks));
        player.send(&format!("settings starting_regions {}", join_ids(pickable)));
        let line = format!("pick_starting_region {}", player.time_bank());
        player.send(&line);

        let reply = player.request();
        match parse_picks(&reply, pickable, max_picks) {
            Ok(picks) => picks,
            Err(e) => {
                warn!(player = %player.name(), "{}", e);
                Vec::new()
            }
        }
    }

    fn send_round_start(&self, player: &mut Player, view: &MapView, observed: &[Move]) {
        send_starting_armies(player);
        player.send(&format!("update_map {}", standings_json(view)));
        let line = moves_line("visible_moves", observed.iter().filter(|mv| mv.is_legal()));
        player.send(&line);
    }

    fn max_moves(&self) -> usize {
        self.settings.max_moves_per_turn
    }
}
