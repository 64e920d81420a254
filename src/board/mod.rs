//! Map model and game settings.
//!
//! Contains the region graph, per-player fog views, the settings bundle and
//! the WarZone map JSON loader.

pub mod fog;
pub mod map;
pub mod map_json;
pub mod region;
pub mod settings;

pub use fog::{apply_fog, FogLevel, MapView, Standing};
pub use map::{Map, MapError};
pub use map_json::{load_map, map_to_json, parse_map, MapJsonError};
pub use region::{BonusId, Owner, Region, RegionId, SuperRegion, OWNER_FOG, OWNER_NEUTRAL};
pub use settings::{
    DistributionMode, FirstPlayer, MoveOrder, RoundingMode, Settings, SettingsError, Wastelands,
};
