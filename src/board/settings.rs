//! Game settings.
//!
//! Settings are read from a JSON object using the WarZone key names. Every
//! key is optional and falls back to the built-in default (a "1v1 small
//! earth, one wasteland" profile); values are range-checked on load. The
//! same JSON shape is sent back to V1 bots as `all_settings_json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fog::FogLevel;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("setting {key} has value {value} outside the supported range [{min}, {max}]")]
    OutOfRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// How fractional casualties become whole armies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Round to the nearest integer.
    #[default]
    #[serde(rename = "StraightRound")]
    Straight,
    /// Floor, then add one with probability equal to the remainder.
    #[serde(rename = "WeightedRandom")]
    WeightedRandom,
}

/// Which regions are offered in the starting-region draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum DistributionMode {
    /// One random region per bonus.
    #[default]
    RandomWarlords,
    /// Every region of each bonus except one random region.
    RandomCities,
    /// Every region.
    Full,
}

impl TryFrom<i32> for DistributionMode {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(DistributionMode::RandomWarlords),
            -2 => Ok(DistributionMode::RandomCities),
            -3 => Ok(DistributionMode::Full),
            other => Err(format!("unsupported distribution mode {}", other)),
        }
    }
}

impl From<DistributionMode> for i32 {
    fn from(mode: DistributionMode) -> i32 {
        match mode {
            DistributionMode::RandomWarlords => -1,
            DistributionMode::RandomCities => -2,
            DistributionMode::Full => -3,
        }
    }
}

/// Interleaving policy for attack/transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveOrder {
    /// Players alternate, the round leader alternating every round.
    #[default]
    #[serde(rename = "Cycle", alias = "NoLuckCycle")]
    Cycle,
    /// A coin flip decides who leads each pair of moves.
    #[serde(rename = "Random")]
    Random,
}

/// Who receives the first starting-region pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirstPlayer {
    #[default]
    #[serde(rename = "1")]
    Player1,
    #[serde(rename = "2")]
    Player2,
    #[serde(rename = "Random")]
    Random,
}

/// Wasteland placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Wastelands {
    pub number_of_wastelands: u32,
    pub wasteland_size: u32,
}

impl Default for Wastelands {
    fn default() -> Self {
        Wastelands {
            number_of_wastelands: 7,
            wasteland_size: 10,
        }
    }
}

/// The immutable rule bundle for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    /// Percent chance that one attacking army kills a defender.
    pub offensive_kill_rate: f64,
    /// Percent chance that one defending army kills an attacker.
    pub defensive_kill_rate: f64,
    /// 0 = fully deterministic casualties, 1 = fully random.
    pub luck_modifier: f64,
    pub rounding_mode: RoundingMode,
    /// Starting territories per player.
    #[serde(rename = "TerritoryLimit")]
    pub starting_territories: u32,
    pub distribution_mode: DistributionMode,
    #[serde(rename = "InitialPlayerArmiesPerTerritory")]
    pub initial_player_armies: u32,
    /// Armies on every neutral region at setup.
    #[serde(rename = "InitialNonDistributionArmies")]
    pub neutral_armies: u32,
    /// Armies on pickable regions nobody drafted.
    #[serde(rename = "InitialNeutralsInDistribution")]
    pub neutrals_in_distribution: u32,
    pub wastelands: Wastelands,
    /// Base income per round before bonuses.
    #[serde(rename = "MinimumArmyBonus")]
    pub base_armies_per_turn: u32,
    pub move_order: MoveOrder,
    #[serde(rename = "Fog")]
    pub fog: FogLevel,
    pub first_player: FirstPlayer,
    /// 0 derives the limit from the map size.
    pub rounds_until_draw: u32,
    /// Time bank cap and starting value, in milliseconds.
    pub max_time_bank: u64,
    /// Milliseconds added to the time bank after every request.
    pub time_per_move: u64,
    /// Moves parsed from a single reply; the rest are dropped.
    pub max_moves_per_turn: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            offensive_kill_rate: 60.0,
            defensive_kill_rate: 70.0,
            luck_modifier: 0.18,
            rounding_mode: RoundingMode::Straight,
            starting_territories: 3,
            distribution_mode: DistributionMode::RandomWarlords,
            initial_player_armies: 5,
            neutral_armies: 2,
            neutrals_in_distribution: 4,
            wastelands: Wastelands::default(),
            base_armies_per_turn: 5,
            move_order: MoveOrder::Cycle,
            fog: FogLevel::Normal,
            first_player: FirstPlayer::Player1,
            rounds_until_draw: 60,
            max_time_bank: 10_000,
            time_per_move: 500,
            max_moves_per_turn: 100,
        }
    }
}

impl Settings {
    /// Parses settings from a JSON object, filling missing keys with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every bounded value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("OffensiveKillRate", self.offensive_kill_rate, 1.0, 100.0)?;
        check_range("DefensiveKillRate", self.defensive_kill_rate, f64::MIN_POSITIVE, 100.0)?;
        check_range("LuckModifier", self.luck_modifier, 0.0, 1.0)?;
        check_range("TerritoryLimit", f64::from(self.starting_territories), 1.0, f64::MAX)?;
        check_range("MaxMovesPerTurn", self.max_moves_per_turn as f64, 1.0, f64::MAX)?;
        Ok(())
    }

    pub fn offensive_kill_ratio(&self) -> f64 {
        self.offensive_kill_rate / 100.0
    }

    pub fn defensive_kill_ratio(&self) -> f64 {
        self.defensive_kill_rate / 100.0
    }

    /// Round limit for a map with `region_count` regions.
    pub fn max_rounds(&self, region_count: usize) -> u32 {
        if self.rounds_until_draw > 0 {
            self.rounds_until_draw
        } else {
            ((region_count as f64 * 2.5) as u32).max(50)
        }
    }

    /// Single-line JSON rendering, as sent to bots.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn check_range(key: &'static str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if value.is_nan() || value < min || value > max {
        return Err(SettingsError::OutOfRange { key, value, min, max });
    }
    Ok(())
}
