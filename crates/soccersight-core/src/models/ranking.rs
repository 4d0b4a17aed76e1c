use serde::{Deserialize, Serialize};

use super::team::deserialize_id;

/// Season the dashboard predicts rankings for unless told otherwise.
pub const DEFAULT_SEASON_ID: i32 = 2026;

/// Predicted standing for one period of the season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MonthlyRank {
    pub data_period: String,
    pub expected_rank: u32,
    pub team_rating: f64,
    pub expected_winrate: f64,
    pub expected_goals: f64,
    pub schedule_difficulty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeamRanking {
    #[serde(deserialize_with = "deserialize_id")]
    pub team_id: String,
    pub season_id: i32,
    #[serde(default)]
    pub monthly: Vec<MonthlyRank>,
}

impl TeamRanking {
    /// The most recent period's prediction, if any.
    pub fn latest(&self) -> Option<&MonthlyRank> {
        self.monthly.iter().max_by(|a, b| a.data_period.cmp(&b.data_period))
    }
}
