//! Plain-text rendering for command output.

use std::path::Path;

use chrono::{DateTime, Utc};

use soccersight_core::models::{
    team_name, GoalStats, GrowthMetric, LineupRecommendation, LineupRequest, LogKind, Player,
    PlayerGrowth, RosterAction, SimulationLog, StrategyPrediction, StrategyRequest, Team, TeamRanking, TradeResult,
    TransferRequest, TransferResult, TransferType,
};
use soccersight_core::utils::{delta_summary, format_percent, format_signed, truncate};
use soccersight_core::{Config, ContextSource, SessionContext, SwitchOutcome, SwitchStatus, TeamContext};

/// Widest team name column before truncation
const NAME_WIDTH: usize = 18;

fn name_or_id<'a>(teams: &'a [Team], team_id: &'a str) -> &'a str {
    team_name(teams, team_id).unwrap_or(team_id)
}

pub fn team_context(context: &TeamContext, now: DateTime<Utc>) {
    let name = if context.my_team_name.is_empty() {
        "(unknown team)"
    } else {
        context.my_team_name.as_str()
    };
    println!("My team: {} [{}]", name, context.my_team_id);

    match (context.source, context.cached_at) {
        (ContextSource::Cache, Some(cached_at)) => {
            let minutes = (now - cached_at).num_minutes().max(0);
            println!("Source:  cache (saved {}m ago)", minutes);
        }
        (source, _) => println!("Source:  {}", source),
    }
    if context.source == ContextSource::Fallback {
        println!("         backend session unavailable, showing the default team");
    }

    if !context.matches.is_empty() {
        println!();
        println!("Recent matches:");
        for m in &context.matches {
            let opponent = m.opponent.to_string();
            println!(
                "  {}  {} {}  vs {:<w$}  {}",
                m.match_date,
                m.outcome(),
                m.score_line(),
                truncate(name_or_id(&context.teams, &opponent), NAME_WIDTH),
                m.venue(),
                w = NAME_WIDTH
            );
        }
    }

    println!();
    teams(&context.teams, Some(&context.my_team_id));
}

pub fn switch_outcome(outcome: &SwitchOutcome) {
    let context = &outcome.context;
    match &outcome.status {
        SwitchStatus::Synced => {
            println!("Active team is now {} [{}]", context.my_team_name, context.my_team_id)
        }
        SwitchStatus::Superseded => {
            println!("Switch to [{}] was overtaken by a newer switch", context.my_team_id)
        }
        SwitchStatus::Failed(_) => {
            println!(
                "Could not confirm the switch with the backend; using [{}] locally",
                context.my_team_id
            );
        }
    }
}

pub fn session_status(session: Option<&SessionContext>, now: DateTime<Utc>) {
    match session {
        Some(session) => {
            println!(
                "Cached team: {} [{}], saved {}, expires in {}m",
                session.my_team_name,
                session.my_team_id,
                session.age_display_at(now),
                session.remaining_at(now).num_minutes()
            );
        }
        None => println!("No valid team session cached"),
    }
}

pub fn teams(teams: &[Team], my_team_id: Option<&str>) {
    if teams.is_empty() {
        println!("No teams available");
        return;
    }
    println!("{:>4}  {}", "ID", "Team");
    for team in teams {
        let marker = if Some(team.team_id.as_str()) == my_team_id { " *" } else { "" };
        println!("{:>4}  {}{}", team.team_id, team.team_name, marker);
    }
}

pub fn players(players: &[Player]) {
    if players.is_empty() {
        println!("No players found");
        return;
    }
    println!("{:>6}  {:<4}  {:<16}  {}", "ID", "Pos", "Name", "Team");
    for p in players {
        println!(
            "{:>6}  {:<4}  {:<16}  {}",
            p.player_id, p.position, p.player_name, p.team_id
        );
    }
}

pub fn growth(players: &[PlayerGrowth], metric: GrowthMetric) {
    if players.is_empty() {
        println!("No growth data");
        return;
    }
    println!("Growth ({})", metric.as_str());
    for (rank, p) in players.iter().enumerate() {
        println!(
            "{:>3}. {:<16} {:<4} {}",
            rank + 1,
            p.player_name,
            p.position.as_deref().unwrap_or("-"),
            format_signed(p.growth_rate)
        );
    }
}

pub fn ranking(ranking: &TeamRanking) {
    println!("Team {} - season {}", ranking.team_id, ranking.season_id);
    if ranking.monthly.is_empty() {
        println!("  no predictions yet");
        return;
    }
    println!(
        "  {:<10} {:>4} {:>7} {:>8} {:>6} {:>10}",
        "Period", "Rank", "Rating", "Win %", "xG", "Difficulty"
    );
    for m in &ranking.monthly {
        println!(
            "  {:<10} {:>4} {:>7.1} {:>8} {:>6.2} {:>10.2}",
            m.data_period,
            m.expected_rank,
            m.team_rating,
            format_percent(m.expected_winrate),
            m.expected_goals,
            m.schedule_difficulty
        );
    }
}

pub fn lineup(request: &LineupRequest, recommendation: &LineupRecommendation) {
    println!(
        "Formation {} vs [{}]: fit {}",
        request.formation,
        request.opponent_team_id,
        format_percent(recommendation.formation_fit)
    );
    for slot in &recommendation.recommended_lineup {
        println!(
            "  {:<4} {:<16} {}",
            slot.position,
            slot.player,
            format_percent(slot.fit_score)
        );
    }
}

pub fn strategy(request: &StrategyRequest, prediction: &StrategyPrediction, teams: &[Team]) {
    println!(
        "{}: {} (home) vs {} (away), strategy {}",
        request.match_date,
        name_or_id(teams, &request.home_team_id),
        name_or_id(teams, &request.away_team_id),
        request.strategy
    );
    println!("Expected points: {:.2}", prediction.expected_points);
    println!(
        "Win {} / Draw {} / Loss {} (most likely: {})",
        format_percent(prediction.win_prob),
        format_percent(prediction.draw_prob),
        format_percent(prediction.loss_prob),
        prediction.most_likely()
    );
    for impact in &prediction.strategy_impacts {
        println!(
            "  {}: {} pts ({})",
            impact.strategy,
            format_signed(impact.delta_expected_points),
            impact.note
        );
    }
}

pub fn trade(result: &TradeResult, teams: &[Team], log_id: Option<i64>) {
    for line in delta_summary(&result.delta, teams) {
        println!("{}", line);
    }
    if let Some(ref summary) = result.summary {
        println!("{}", summary);
    }
    if let Some(id) = log_id {
        println!("Logged as #{}", id);
    }
}

pub fn transfer(request: &TransferRequest, result: &TransferResult) {
    let action = match request.kind {
        TransferType::Acquire => "acquired",
        TransferType::Release => "released",
    };
    println!(
        "Team [{}] {} player {}: expected points {}, team rating {:.1}",
        request.team_id,
        action,
        request.player_in_id,
        format_signed(result.expected_points_change),
        result.new_team_rating
    );
    if !result.notes.is_empty() {
        println!("{}", result.notes);
    }
    if let Some(id) = result.log_id {
        println!("Logged as #{}", id);
    }
}

pub fn logs(logs: &[&SimulationLog], teams: &[Team], player_name: impl Fn(&str) -> String) {
    if logs.is_empty() {
        println!("Simulation log is empty");
        return;
    }
    for log in logs {
        match log.kind {
            LogKind::Trade => {
                let team_a = log.team_a_id.as_deref().unwrap_or("?");
                let team_b = log.team_b_id.as_deref().unwrap_or("?");
                let give: Vec<String> = log.players_a.iter().map(|p| player_name(p.as_str())).collect();
                let get: Vec<String> = log.players_b.iter().map(|p| player_name(p.as_str())).collect();
                println!(
                    "#{:<5} trade     {} ({}) <-> {} ({})",
                    log.log_id,
                    name_or_id(teams, team_a),
                    give.join(", "),
                    name_or_id(teams, team_b),
                    get.join(", ")
                );
                if let Some(ref delta) = log.delta {
                    for line in delta_summary(delta, teams) {
                        println!("        {}", line);
                    }
                }
            }
            LogKind::Acquire | LogKind::Release => {
                let team = log.team_id.as_deref().unwrap_or("?");
                let player = log
                    .player_in_id
                    .as_deref()
                    .map(&player_name)
                    .unwrap_or_else(|| "?".to_string());
                let kind = if log.kind == LogKind::Acquire { "acquire" } else { "release" };
                let points = log
                    .expected_points_change
                    .map(format_signed)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<5} {:<9} {} {} ({} pts)",
                    log.log_id,
                    kind,
                    name_or_id(teams, team),
                    player,
                    points
                );
            }
            LogKind::Unknown => {}
        }
    }
}

pub fn goal_stats(season_id: i32, stats: &GoalStats, my_team_name: &str) {
    let team = if my_team_name.is_empty() { "Team" } else { my_team_name };
    println!("Goals - season {}", season_id);
    println!("  League total: {:>4}", stats.league_total_goals);
    println!(
        "  {}: {:>4} ({} of league)",
        team,
        stats.team_total_goals,
        format_percent(stats.league_share())
    );
    println!(
        "  Midfielders:  {:>4} ({} of team)",
        stats.midfielder_goals,
        format_percent(stats.team_share(stats.midfielder_goals))
    );
    println!(
        "  Forwards:     {:>4} ({} of team)",
        stats.forward_goals,
        format_percent(stats.team_share(stats.forward_goals))
    );
}

pub fn roster_updated(action: RosterAction, player_id: &str) {
    match action {
        RosterAction::Acquire => println!("Player {} joined the squad", player_id),
        RosterAction::Release => println!("Player {} was released", player_id),
    }
}

pub fn config(config: &Config, path: &Path) {
    println!("Config file:     {}", path.display());
    println!("API base URL:    {}", config.api_base_url);
    println!("Default team:    {}", config.default_team_id);
    println!("Request timeout: {}s", config.request_timeout().as_secs());
    match config.cache_dir() {
        Ok(dir) => println!("Cache dir:       {}", dir.display()),
        Err(e) => println!("Cache dir:       unavailable ({})", e),
    }
}
