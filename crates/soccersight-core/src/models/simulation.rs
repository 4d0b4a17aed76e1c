//! Request and response types for the simulation endpoints.
//!
//! The backend computes every number here (fit scores, outcome probabilities,
//! trade deltas); the client only sends the inputs and decodes the results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use super::team::{deserialize_id, deserialize_optional_id};

// ============================================================================
// Lineup
// ============================================================================

/// Supported formations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Formation {
    #[serde(rename = "4-3-3")]
    FourThreeThree,
    #[serde(rename = "3-5-2")]
    ThreeFiveTwo,
    #[serde(rename = "4-4-2")]
    FourFourTwo,
}

impl Formation {
    pub const ALL: [Formation; 3] = [
        Formation::FourThreeThree,
        Formation::ThreeFiveTwo,
        Formation::FourFourTwo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Formation::FourThreeThree => "4-3-3",
            Formation::ThreeFiveTwo => "3-5-2",
            Formation::FourFourTwo => "4-4-2",
        }
    }
}

impl std::fmt::Display for Formation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Formation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formation::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported formation '{}' (expected 4-3-3, 3-5-2 or 4-4-2)", s))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupRequest {
    pub team_id: String,
    pub formation: Formation,
    pub opponent_team_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LineupSlot {
    pub position: String,
    pub player: String,
    pub fit_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LineupRecommendation {
    pub formation_fit: f64,
    #[serde(default)]
    pub recommended_lineup: Vec<LineupSlot>,
}

// ============================================================================
// Match strategy
// ============================================================================

/// Strategy sent when the caller does not pick one.
pub const DEFAULT_STRATEGY: &str = "attack_focus";

#[derive(Debug, Clone, Serialize)]
pub struct StrategyRequest {
    pub match_date: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StrategyImpact {
    pub strategy: String,
    pub delta_expected_points: f64,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StrategyPrediction {
    pub expected_points: f64,
    pub win_prob: f64,
    pub draw_prob: f64,
    pub loss_prob: f64,
    #[serde(default)]
    pub strategy_impacts: Vec<StrategyImpact>,
}

impl StrategyPrediction {
    /// The likeliest outcome label, ties resolved toward the better result.
    pub fn most_likely(&self) -> &'static str {
        if self.win_prob >= self.draw_prob && self.win_prob >= self.loss_prob {
            "win"
        } else if self.draw_prob >= self.loss_prob {
            "draw"
        } else {
            "loss"
        }
    }
}

// ============================================================================
// Trade
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TradeRequest {
    pub team_a_id: String,
    pub team_b_id: String,
    #[serde(serialize_with = "serialize_ids")]
    pub players_a: Vec<String>,
    #[serde(serialize_with = "serialize_ids")]
    pub players_b: Vec<String>,
}

/// Per-team change in strength after a trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TeamDelta {
    pub attack: f64,
    pub defense: f64,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TradeResult {
    pub delta: BTreeMap<String, TeamDelta>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub log_id: Option<i64>,
}

// ============================================================================
// Transfer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Acquire,
    Release,
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferType::Acquire => write!(f, "acquire"),
            TransferType::Release => write!(f, "release"),
        }
    }
}

impl std::str::FromStr for TransferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "acquire" => Ok(TransferType::Acquire),
            "release" => Ok(TransferType::Release),
            other => Err(format!("unknown transfer type '{}' (expected acquire or release)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    pub team_id: String,
    pub player_in_id: String,
    #[serde(rename = "type")]
    pub kind: TransferType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TransferResult {
    pub expected_points_change: f64,
    pub new_team_rating: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub log_id: Option<i64>,
}

// ============================================================================
// Simulation log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Acquire,
    Release,
    Trade,
    #[serde(other)]
    Unknown,
}

/// A stored trade or transfer simulation.
/// Which optional fields are set depends on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationLog {
    pub log_id: i64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub player_in_id: Option<String>,
    #[serde(default)]
    pub expected_points_change: Option<f64>,
    #[serde(default)]
    pub new_team_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub team_a_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub team_b_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub players_a: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_id_list")]
    pub players_b: Vec<String>,
    #[serde(default)]
    pub delta: Option<BTreeMap<String, TeamDelta>>,
}

impl SimulationLog {
    /// A trade entry is only usable when both sides are known.
    pub fn is_complete_trade(&self) -> bool {
        self.kind == LogKind::Trade && self.team_a_id.is_some() && self.team_b_id.is_some()
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self.kind, LogKind::Acquire | LogKind::Release)
    }
}

/// Body for recording a simulation in the log.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NewSimulationLog {
    Trade {
        team_a_id: String,
        team_b_id: String,
        #[serde(serialize_with = "serialize_ids")]
        players_a: Vec<String>,
        #[serde(serialize_with = "serialize_ids")]
        players_b: Vec<String>,
        delta: BTreeMap<String, TeamDelta>,
    },
    Acquire {
        team_id: String,
        player_in_id: String,
        expected_points_change: f64,
        new_team_rating: f64,
    },
    Release {
        team_id: String,
        player_in_id: String,
        expected_points_change: f64,
        new_team_rating: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedLog {
    pub log_id: i64,
}

// The trade endpoint expects numeric player ids; non-numeric ids pass through as strings
fn serialize_ids<S>(ids: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(ids.len()))?;
    for id in ids {
        match id.parse::<i64>() {
            Ok(n) => seq.serialize_element(&n)?,
            Err(_) => seq.serialize_element(id)?,
        }
    }
    seq.end()
}

fn deserialize_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Id(#[serde(deserialize_with = "deserialize_id")] String);

    let ids: Option<Vec<Id>> = Option::deserialize(deserializer)?;
    Ok(ids
        .unwrap_or_default()
        .into_iter()
        .map(|Id(id)| id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formation_parse() {
        assert_eq!("4-4-2".parse::<Formation>().unwrap(), Formation::FourFourTwo);
        assert!("5-4-1".parse::<Formation>().is_err());
        assert_eq!(
            serde_json::to_string(&Formation::ThreeFiveTwo).unwrap(),
            "\"3-5-2\""
        );
    }

    #[test]
    fn test_trade_request_sends_numeric_ids() {
        let req = TradeRequest {
            team_a_id: "10".to_string(),
            team_b_id: "9".to_string(),
            players_a: vec!["367".to_string()],
            players_b: vec!["p-23".to_string()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["players_a"], serde_json::json!([367]));
        assert_eq!(json["players_b"], serde_json::json!(["p-23"]));
    }

    #[test]
    fn test_transfer_request_type_field() {
        let req = TransferRequest {
            team_id: "9".to_string(),
            player_in_id: "365".to_string(),
            kind: TransferType::Release,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "release");
    }

    #[test]
    fn test_simulation_log_variants() {
        let logs: Vec<SimulationLog> = serde_json::from_str(
            r#"[
                {"log_id": 101, "type": "acquire", "team_id": "ulsan", "player_in_id": "365",
                 "expected_points_change": 3.2, "new_team_rating": 81.4},
                {"log_id": 100, "type": "trade", "team_a_id": 9, "team_b_id": 12,
                 "players_a": [365], "players_b": ["23"],
                 "delta": {"9": {"attack": 3.1, "defense": 2.8, "rating": 0.4}}},
                {"log_id": 99, "type": "loan"}
            ]"#,
        )
        .unwrap();

        assert!(logs[0].is_transfer());
        assert_eq!(logs[0].expected_points_change, Some(3.2));

        assert!(logs[1].is_complete_trade());
        assert_eq!(logs[1].players_a, vec!["365".to_string()]);
        assert_eq!(logs[1].team_b_id.as_deref(), Some("12"));

        assert_eq!(logs[2].kind, LogKind::Unknown);
        assert!(!logs[2].is_complete_trade());
    }

    #[test]
    fn test_new_log_is_tagged() {
        let log = NewSimulationLog::Acquire {
            team_id: "10".to_string(),
            player_in_id: "367".to_string(),
            expected_points_change: 3.2,
            new_team_rating: 81.4,
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["type"], "acquire");
        assert_eq!(json["player_in_id"], "367");
    }

    #[test]
    fn test_most_likely_outcome() {
        let prediction = StrategyPrediction {
            expected_points: 1.8,
            win_prob: 0.6,
            draw_prob: 0.25,
            loss_prob: 0.15,
            strategy_impacts: vec![],
        };
        assert_eq!(prediction.most_likely(), "win");
    }
}
