use serde::{Deserialize, Serialize};

use super::team::{deserialize_id, deserialize_optional_id};

/// A rostered player as listed by the players endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Player {
    #[serde(deserialize_with = "deserialize_id")]
    pub player_id: String,
    pub player_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub team_id: String,
}

/// Optional filters for the player list. Empty fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct PlayerFilter {
    pub team_id: Option<String>,
    pub position: Option<String>,
}

impl PlayerFilter {
    pub fn for_team(team_id: impl Into<String>) -> Self {
        Self {
            team_id: Some(team_id.into()),
            position: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(team_id) = self.team_id.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("team_id", team_id.to_string()));
        }
        if let Some(position) = self.position.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("position", position.to_string()));
        }
        pairs
    }
}

/// Find a player's display name, falling back to the raw id.
pub fn player_name(players: &[Player], player_id: &str) -> String {
    players
        .iter()
        .find(|p| p.player_id == player_id)
        .map(|p| p.player_name.clone())
        .unwrap_or_else(|| player_id.to_string())
}

/// Which growth metric the player analysis ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthMetric {
    #[default]
    Offense,
    Defense,
    Overall,
}

impl GrowthMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthMetric::Offense => "offense",
            GrowthMetric::Defense => "defense",
            GrowthMetric::Overall => "overall",
        }
    }
}

impl std::str::FromStr for GrowthMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offense" => Ok(GrowthMetric::Offense),
            "defense" => Ok(GrowthMetric::Defense),
            "overall" => Ok(GrowthMetric::Overall),
            other => Err(format!("unknown growth metric: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query for the player growth analysis endpoint.
#[derive(Debug, Clone, Default)]
pub struct GrowthQuery {
    pub team_id: String,
    pub position: Option<String>,
    pub metric: GrowthMetric,
    pub sort: SortOrder,
}

impl GrowthQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("team_id", self.team_id.clone())];
        if let Some(position) = self.position.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("position", position.to_string()));
        }
        pairs.push(("metric", self.metric.as_str().to_string()));
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs
    }
}

/// A player's growth figure from the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PlayerGrowth {
    #[serde(deserialize_with = "deserialize_id")]
    pub player_id: String,
    pub player_name: String,
    pub growth_rate: f64,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrowthResponse {
    #[serde(default)]
    pub players: Vec<PlayerGrowth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_skips_empty_fields() {
        let filter = PlayerFilter {
            team_id: Some("10".to_string()),
            position: Some(String::new()),
        };
        assert_eq!(filter.query_pairs(), vec![("team_id", "10".to_string())]);
        assert!(PlayerFilter::default().query_pairs().is_empty());
    }

    #[test]
    fn test_player_numeric_ids() {
        let p: Player = serde_json::from_str(
            r#"{"player_id": 367, "player_name": "문선민", "position": "FW", "team_id": 10}"#,
        )
        .unwrap();
        assert_eq!(p.player_id, "367");
        assert_eq!(p.team_id, "10");
    }

    #[test]
    fn test_player_name_falls_back_to_id() {
        let players = vec![Player {
            player_id: "365".to_string(),
            player_name: "조규성".to_string(),
            position: "FW".to_string(),
            team_id: "9".to_string(),
        }];
        assert_eq!(player_name(&players, "365"), "조규성");
        assert_eq!(player_name(&players, "999"), "999");
    }

    #[test]
    fn test_growth_query_pairs() {
        let query = GrowthQuery {
            team_id: "10".to_string(),
            position: Some("MF".to_string()),
            metric: GrowthMetric::Defense,
            sort: SortOrder::Asc,
        };
        let pairs = query.query_pairs();
        assert_eq!(pairs[0], ("team_id", "10".to_string()));
        assert!(pairs.contains(&("metric", "defense".to_string())));
        assert!(pairs.contains(&("sort", "asc".to_string())));
    }

    #[test]
    fn test_growth_response_missing_players() {
        let resp: GrowthResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.players.is_empty());
    }
}
