use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A league club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Team {
    #[serde(deserialize_with = "deserialize_id")]
    pub team_id: String,
    pub team_name: String,
}

impl Team {
    pub fn new(team_id: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
        }
    }
}

/// Find the display name for a team id, if the id is in the list.
pub fn team_name<'a>(teams: &'a [Team], team_id: &str) -> Option<&'a str> {
    teams
        .iter()
        .find(|t| t.team_id == team_id)
        .map(|t| t.team_name.as_str())
}

/// Drop repeated team ids, keeping the first occurrence and the original order.
/// The teams endpoint joins across seasons and can list a club more than once.
pub fn dedup_teams(teams: Vec<Team>) -> Vec<Team> {
    let mut seen = HashSet::new();
    teams
        .into_iter()
        .filter(|t| seen.insert(t.team_id.clone()))
        .collect()
}

/// Outcome of a finished match from the active team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchOutcome::Win => write!(f, "W"),
            MatchOutcome::Draw => write!(f, "D"),
            MatchOutcome::Loss => write!(f, "L"),
        }
    }
}

/// A recent match result for the active team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Match {
    pub match_date: String,
    pub opponent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub score_us: u32,
    pub score_opponent: u32,
    pub is_home: bool,
}

impl Match {
    /// Use the backend's result label when it sends one, otherwise derive it from the score.
    pub fn outcome(&self) -> MatchOutcome {
        match self.result.as_deref().map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("w") || r.eq_ignore_ascii_case("win") => {
                MatchOutcome::Win
            }
            Some(r) if r.eq_ignore_ascii_case("d") || r.eq_ignore_ascii_case("draw") => {
                MatchOutcome::Draw
            }
            Some(r) if r.eq_ignore_ascii_case("l") || r.eq_ignore_ascii_case("loss") => {
                MatchOutcome::Loss
            }
            _ => match self.score_us.cmp(&self.score_opponent) {
                std::cmp::Ordering::Greater => MatchOutcome::Win,
                std::cmp::Ordering::Equal => MatchOutcome::Draw,
                std::cmp::Ordering::Less => MatchOutcome::Loss,
            },
        }
    }

    pub fn score_line(&self) -> String {
        format!("{} - {}", self.score_us, self.score_opponent)
    }

    pub fn venue(&self) -> &'static str {
        if self.is_home {
            "H"
        } else {
            "A"
        }
    }
}

/// Response from the get-my-team endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MyTeamResponse {
    #[serde(deserialize_with = "deserialize_id")]
    pub my_team_id: String,
}

/// Response from the set-my-team endpoint. It doubles as a full context fetch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetTeamResponse {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub my_team_id: Option<String>,
}

// Ids arrive as either JSON strings or numbers depending on the endpoint
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct IdVisitor;

    impl<'de> de::Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_id")] String);

    let value: Option<Wrapper> = Option::deserialize(deserializer)?;
    Ok(value.map(|Wrapper(id)| id).filter(|id| !id.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_id_accepts_numbers() {
        let teams: Vec<Team> =
            serde_json::from_str(r#"[{"team_id": 10, "team_name": "전북 현대 모터스"}, {"team_id": "9", "team_name": "울산 현대 FC"}]"#)
                .unwrap();
        assert_eq!(teams[0].team_id, "10");
        assert_eq!(teams[1].team_id, "9");
    }

    #[test]
    fn test_dedup_teams_keeps_first() {
        let teams = vec![
            Team::new("1", "강원 FC"),
            Team::new("2", "광주 FC"),
            Team::new("1", "강원 FC (2025)"),
        ];
        let deduped = dedup_teams(teams);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].team_name, "강원 FC");
        assert_eq!(deduped[1].team_id, "2");
    }

    #[test]
    fn test_team_name_lookup() {
        let teams = vec![Team::new("10", "전북 현대 모터스")];
        assert_eq!(team_name(&teams, "10"), Some("전북 현대 모터스"));
        assert_eq!(team_name(&teams, "11"), None);
    }

    #[test]
    fn test_match_outcome_from_score() {
        let m = Match {
            match_date: "2025-11-08".to_string(),
            opponent: 8,
            result: None,
            score_us: 1,
            score_opponent: 2,
            is_home: true,
        };
        assert_eq!(m.outcome(), MatchOutcome::Loss);
        assert_eq!(m.score_line(), "1 - 2");
        assert_eq!(m.venue(), "H");
    }

    #[test]
    fn test_match_outcome_prefers_result_label() {
        let m = Match {
            match_date: "2025-11-08".to_string(),
            opponent: 8,
            result: Some("W".to_string()),
            score_us: 0,
            score_opponent: 0,
            is_home: false,
        };
        assert_eq!(m.outcome(), MatchOutcome::Win);
    }

    #[test]
    fn test_set_team_response_tolerates_missing_fields() {
        let resp: SetTeamResponse = serde_json::from_str(r#"{"my_team_id": 10}"#).unwrap();
        assert!(resp.teams.is_empty());
        assert!(resp.matches.is_empty());
        assert_eq!(resp.my_team_id.as_deref(), Some("10"));
    }
}
