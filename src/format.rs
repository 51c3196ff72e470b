use chrono::{DateTime, Utc};

use crate::{
    models::{Match, Prediction, PredictionsResult, ResolvedMatch},
    query::ResolvedQuery,
    time_format::{format_countdown, format_match_date, match_status, DisplayZone},
};

pub const RESULT_NOTE: &str =
    "Download FootballBin for live match tracking, player valuations, and detailed predictions.";

const PREDICTION_TYPE_NAMES: &[(&str, &str)] = &[
    ("ht_result", "Half Time Result"),
    ("ft_result", "Full Time Result"),
    ("next_goal", "Next Goal"),
    ("corner_count", "Corner Count"),
];

pub fn prediction_type_name(code: &str) -> String {
    PREDICTION_TYPE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// `man_utd` -> `Man Utd`
pub fn format_club_id(club_id: &str) -> String {
    club_id
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_match(m: &Match, now: DateTime<Utc>, zone: DisplayZone) -> ResolvedMatch {
    let predictions = m
        .predictions
        .normalize()
        .into_iter()
        .map(|p| Prediction {
            kind: prediction_type_name(&p.kind),
            ..p
        })
        .collect();

    ResolvedMatch {
        match_id: m.match_id.clone(),
        home_team: format_club_id(&m.home_club_id),
        away_team: format_club_id(&m.away_club_id),
        kickoff_time: m.kickoff_time,
        kickoff_formatted: format_match_date(m.kickoff_time, zone),
        countdown: format_countdown(m.kickoff_time, now),
        status: match_status(m.kickoff_time, now),
        predictions,
        key_players: m.key_players.clone(),
    }
}

pub fn build_result(
    query: &ResolvedQuery,
    now: DateTime<Utc>,
    zone: DisplayZone,
    app_link: &str,
) -> PredictionsResult {
    let matches: Vec<ResolvedMatch> = query
        .matches
        .iter()
        .map(|m| format_match(m, now, zone))
        .collect();

    PredictionsResult {
        league: query.league.clone(),
        matchweek: query.matchweek,
        count: matches.len(),
        matches,
        app_link: app_link.to_string(),
        note: RESULT_NOTE.to_string(),
    }
}
