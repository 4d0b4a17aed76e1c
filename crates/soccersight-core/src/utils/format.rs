use std::collections::BTreeMap;

use crate::models::{team_name, Team, TeamDelta};

/// Format a change with an explicit sign, e.g. `+3.1` or `-1.2`
pub fn format_signed(value: f64) -> String {
    let formatted = format!("{:.1}", value);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

/// Format a probability in [0, 1] as a whole percentage
pub fn format_percent(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

/// One line per team describing a trade's effect, using team names where known
pub fn delta_summary(delta: &BTreeMap<String, TeamDelta>, teams: &[Team]) -> Vec<String> {
    delta
        .iter()
        .map(|(team_id, d)| {
            let name = team_name(teams, team_id).unwrap_or(team_id.as_str());
            format!(
                "{}: attack {}, defense {}, rating {}",
                name,
                format_signed(d.attack),
                format_signed(d.defense),
                format_signed(d.rating)
            )
        })
        .collect()
}

/// Truncate to a maximum number of characters, adding an ellipsis if needed
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(3.1), "+3.1");
        assert_eq!(format_signed(-1.2), "-1.2");
        assert_eq!(format_signed(0.0), "+0.0");
    }

    #[test]
    fn test_format_signed_negative_zero_has_one_sign() {
        assert_eq!(format_signed(-0.0), "-0.0");
        assert_eq!(format_signed(-0.04), "-0.0");
        assert_eq!(format_signed(0.04), "+0.0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.6), "60%");
        assert_eq!(format_percent(0.15), "15%");
    }

    #[test]
    fn test_delta_summary_uses_names() {
        let mut delta = BTreeMap::new();
        delta.insert(
            "10".to_string(),
            TeamDelta { attack: 3.1, defense: 2.8, rating: 0.4 },
        );
        delta.insert(
            "99".to_string(),
            TeamDelta { attack: -1.2, defense: 0.9, rating: 0.1 },
        );
        let teams = vec![Team::new("10", "전북 현대 모터스")];

        let lines = delta_summary(&delta, &teams);
        assert_eq!(lines[0], "전북 현대 모터스: attack +3.1, defense +2.8, rating +0.4");
        assert_eq!(lines[1], "99: attack -1.2, defense +0.9, rating +0.1");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("전북 현대 모터스", 20), "전북 현대 모터스");
        assert_eq!(truncate("수원 삼성 블루윙즈", 6), "수원 ...");
    }
}
