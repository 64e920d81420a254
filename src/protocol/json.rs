//! JSON payloads embedded in V1 protocol lines and in the replay record.

use serde::{Deserialize, Serialize};

use crate::board::{MapView, RegionId, Standing};

/// `fogLevel` of a standing as bots see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Fog,
}

/// One region's owner and armies, as sent in `update_map`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingJson {
    #[serde(rename = "terrID")]
    pub terr_id: RegionId,
    pub armies: i64,
    #[serde(rename = "ownedBy")]
    pub owned_by: String,
    #[serde(rename = "fogLevel")]
    pub fog_level: Visibility,
}

impl From<&Standing> for StandingJson {
    fn from(standing: &Standing) -> Self {
        StandingJson {
            terr_id: standing.id,
            armies: standing.armies_or_unknown(),
            owned_by: standing.owner_name().to_string(),
            fog_level: if standing.is_fogged() {
                Visibility::Fog
            } else {
                Visibility::Visible
            },
        }
    }
}

pub fn standings(view: &MapView) -> Vec<StandingJson> {
    view.iter().map(StandingJson::from).collect()
}

/// The standings array as a single-line JSON string.
pub fn standings_json(view: &MapView) -> String {
    serde_json::to_string(&standings(view)).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::tests::{give, sample_map};
    use crate::board::{apply_fog, FogLevel};

    #[test]
    fn visible_and_fogged_standings() {
        let mut map = sample_map();
        give(&mut map, 1, "bot1", 4);
        give(&mut map, 6, "bot2", 9);
        let view = apply_fog(&map, "bot1", FogLevel::Normal);
        let json = standings(&view);

        let own = json.iter().find(|s| s.terr_id == 1).unwrap();
        assert_eq!(own.armies, 4);
        assert_eq!(own.owned_by, "bot1");
        assert_eq!(own.fog_level, Visibility::Visible);

        let far = json.iter().find(|s| s.terr_id == 6).unwrap();
        assert_eq!(far.armies, -1);
        assert_eq!(far.owned_by, "fog");
        assert_eq!(far.fog_level, Visibility::Fog);
    }

    #[test]
    fn standings_json_is_one_line() {
        let map = sample_map();
        let text = standings_json(&MapView::full(&map));
        assert!(!text.contains('\n'));
        assert!(text.starts_with("[{\"terrID\":1,"));
        assert!(text.contains("\"fogLevel\":\"Visible\""));
    }
}
