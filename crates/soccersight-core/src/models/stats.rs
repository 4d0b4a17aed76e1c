use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Position marker for a team's subtotal row in the OLAP rollup
const SUBTOTAL_ROW: &str = "SUBTOTAL";

/// Team name of the league-wide grand total row
const TOTAL_ROW: &str = "TOTAL";

/// One row of the goal rollup (season x team x position).
///
/// Subtotal and total rows use the markers above in place of a position or
/// team name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OlapRow {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(deserialize_with = "deserialize_goals")]
    pub total_goals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OlapResponse {
    #[serde(default)]
    pub data: Vec<OlapRow>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Goal statistics are missing the {0} row")]
    MissingRow(&'static str),
}

/// Headline goal figures for the home dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GoalStats {
    pub league_total_goals: u32,
    pub team_total_goals: u32,
    pub midfielder_goals: u32,
    pub forward_goals: u32,
}

impl GoalStats {
    /// Pick the four figures out of the rollup. The first matching row wins;
    /// every figure is required.
    pub fn from_rows(rows: &[OlapRow]) -> Result<Self, StatsError> {
        let position = |row: &OlapRow, wanted: &str| row.position.as_deref() == Some(wanted);
        let is_total = |row: &OlapRow| row.team_name.as_deref() == Some(TOTAL_ROW);

        let team = rows
            .iter()
            .find(|r| position(r, SUBTOTAL_ROW) && !is_total(r))
            .ok_or(StatsError::MissingRow("team subtotal"))?;
        let total = rows
            .iter()
            .find(|r| is_total(r))
            .ok_or(StatsError::MissingRow("league total"))?;
        let forwards = rows
            .iter()
            .find(|r| position(r, "FW"))
            .ok_or(StatsError::MissingRow("FW"))?;
        let midfielders = rows
            .iter()
            .find(|r| position(r, "MF"))
            .ok_or(StatsError::MissingRow("MF"))?;

        Ok(Self {
            league_total_goals: total.total_goals,
            team_total_goals: team.total_goals,
            midfielder_goals: midfielders.total_goals,
            forward_goals: forwards.total_goals,
        })
    }

    /// Share of the team's goals, in [0, 1]. Zero when the team has not scored.
    pub fn team_share(&self, goals: u32) -> f64 {
        if self.team_total_goals == 0 {
            0.0
        } else {
            goals as f64 / self.team_total_goals as f64
        }
    }

    /// The team's share of all league goals.
    pub fn league_share(&self) -> f64 {
        if self.league_total_goals == 0 {
            0.0
        } else {
            self.team_total_goals as f64 / self.league_total_goals as f64
        }
    }
}

// MySQL SUM() comes back as a decimal string through PHP
fn deserialize_goals<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Goals {
        Number(u32),
        Float(f64),
        Text(String),
    }

    match Goals::deserialize(deserializer)? {
        Goals::Number(n) => Ok(n),
        Goals::Float(f) if f >= 0.0 => Ok(f.round() as u32),
        Goals::Float(f) => Err(serde::de::Error::custom(format!("negative goal count {}", f))),
        Goals::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u32>()
                .or_else(|_| trimmed.parse::<f64>().map(|f| f.max(0.0).round() as u32))
                .map_err(|_| serde::de::Error::custom(format!("invalid goal count '{}'", s)))
        }
    }
}

// ============================================================================
// Roster management
// ============================================================================

/// Add a player to our squad or drop one from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterAction {
    Acquire,
    Release,
}

impl std::fmt::Display for RosterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterAction::Acquire => write!(f, "acquire"),
            RosterAction::Release => write!(f, "release"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollup() -> Vec<OlapRow> {
        serde_json::from_str::<OlapResponse>(
            r#"{"data": [
                {"team_name": "전북 현대 모터스", "position": "FW", "total_goals": "21"},
                {"team_name": "전북 현대 모터스", "position": "MF", "total_goals": 12},
                {"team_name": "전북 현대 모터스", "position": "SUBTOTAL", "total_goals": "38"},
                {"team_name": "TOTAL", "position": "SUBTOTAL", "total_goals": "412.0"}
            ]}"#,
        )
        .unwrap()
        .data
    }

    #[test]
    fn test_goal_stats_from_rollup() {
        let stats = GoalStats::from_rows(&rollup()).unwrap();
        assert_eq!(
            stats,
            GoalStats {
                league_total_goals: 412,
                team_total_goals: 38,
                midfielder_goals: 12,
                forward_goals: 21,
            }
        );
    }

    #[test]
    fn test_total_row_is_not_the_team_subtotal() {
        let mut rows = rollup();
        // Grand total listed first must not be taken for the team
        rows.rotate_right(1);
        let stats = GoalStats::from_rows(&rows).unwrap();
        assert_eq!(stats.team_total_goals, 38);
        assert_eq!(stats.league_total_goals, 412);
    }

    #[test]
    fn test_missing_row_is_an_error() {
        let rows: Vec<OlapRow> = rollup()
            .into_iter()
            .filter(|r| r.position.as_deref() != Some("MF"))
            .collect();
        assert_eq!(GoalStats::from_rows(&rows), Err(StatsError::MissingRow("MF")));
        assert_eq!(
            GoalStats::from_rows(&[]),
            Err(StatsError::MissingRow("team subtotal"))
        );
    }

    #[test]
    fn test_shares() {
        let stats = GoalStats::from_rows(&rollup()).unwrap();
        assert!((stats.team_share(stats.forward_goals) - 21.0 / 38.0).abs() < 1e-9);
        assert!((stats.league_share() - 38.0 / 412.0).abs() < 1e-9);

        let empty = GoalStats {
            league_total_goals: 0,
            team_total_goals: 0,
            midfielder_goals: 0,
            forward_goals: 0,
        };
        assert_eq!(empty.team_share(0), 0.0);
        assert_eq!(empty.league_share(), 0.0);
    }

    #[test]
    fn test_roster_response_defaults_to_failure() {
        let response: RosterResponse = serde_json::from_str("{}").unwrap();
        assert!(!response.success);
    }
}
