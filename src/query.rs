use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    aliases::{normalize_league, normalize_team_name},
    error::QueryError,
    models::{Match, ToolCallInput},
    store::MatchStore,
};

#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub league: String,
    pub matchweek: i64,
    pub matches: Vec<Match>,
}

impl ToolCallInput {
    /// Validates untrusted tool arguments.
    ///
    /// A `matchweek` of `0` or `null` means "current"; integral numbers and
    /// numeric strings are accepted. Empty team filters are ignored.
    pub fn from_arguments(arguments: &Value) -> Result<Self, QueryError> {
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(QueryError::InvalidArguments(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        let league = match args.get("league") {
            Some(Value::String(league)) if !league.trim().is_empty() => league.clone(),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(QueryError::InvalidArguments("league is required".to_string()))
            }
            Some(_) => {
                return Err(QueryError::InvalidArguments(
                    "league must be a string".to_string(),
                ))
            }
        };

        Ok(Self {
            league,
            matchweek: parse_matchweek(args.get("matchweek"))?,
            home_team: parse_team(args, "home_team")?,
            away_team: parse_team(args, "away_team")?,
        })
    }
}

fn parse_matchweek(raw: Option<&Value>) -> Result<Option<i64>, QueryError> {
    let invalid = || QueryError::InvalidArguments("matchweek must be a whole number".to_string());
    let number = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => v,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                _ => return Err(invalid()),
            },
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };
    Ok((number != 0).then_some(number))
}

fn parse_team(args: &Map<String, Value>, field: &str) -> Result<Option<String>, QueryError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(QueryError::InvalidArguments(format!(
            "{field} must be a string"
        ))),
    }
}

/// Resolves the effective matchweek, fetches the league partition and applies
/// team filters. Matches come back in kickoff order.
pub async fn resolve_predictions(
    store: &dyn MatchStore,
    input: &ToolCallInput,
) -> Result<ResolvedQuery, QueryError> {
    let league = normalize_league(&input.league);

    let matchweek = match input.matchweek {
        Some(matchweek) => matchweek,
        None => current_matchweek(store, &league).await?,
    };

    let mut matches: Vec<Match> = store
        .matches_by_league(&league)
        .await?
        .into_iter()
        .filter(|m| m.matchweek == matchweek)
        .collect();

    if let Some(home) = input.home_team.as_deref() {
        let filter = normalize_team_name(home);
        matches.retain(|m| club_matches(&m.home_club_id, &filter));
    }
    if let Some(away) = input.away_team.as_deref() {
        let filter = normalize_team_name(away);
        matches.retain(|m| club_matches(&m.away_club_id, &filter));
    }

    if matches.is_empty() {
        return Err(QueryError::NoMatches { league, matchweek });
    }

    matches.sort_by_key(|m| m.kickoff_time);
    debug!(league = %league, matchweek, count = matches.len(), "Resolved matches");

    Ok(ResolvedQuery {
        league,
        matchweek,
        matches,
    })
}

/// The highest current matchweek wins when a league carries several pointers.
async fn current_matchweek(store: &dyn MatchStore, league: &str) -> Result<i64, QueryError> {
    store
        .current_matchweeks()
        .await?
        .into_iter()
        .filter(|mw| mw.league == league)
        .map(|mw| mw.matchweek_number)
        .max()
        .ok_or_else(|| QueryError::NoCurrentMatchweek {
            league: league.to_string(),
        })
}

fn club_matches(club_id: &str, filter: &str) -> bool {
    let club = club_id.to_lowercase();
    club == filter || club.contains(filter)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        error::StoreError,
        models::{MatchweekPointer, Predictions},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 18, 14, 0, 0).unwrap()
    }

    pub(crate) fn fixture(id: &str, week: i64, home: &str, away: &str, kickoff: DateTime<Utc>) -> Match {
        Match {
            league: "premier_league".into(),
            match_id: id.into(),
            matchweek: week,
            home_club_id: home.into(),
            away_club_id: away.into(),
            kickoff_time: kickoff,
            predictions: Predictions::default(),
            key_players: Vec::new(),
        }
    }

    pub(crate) fn pointer(league: &str, week: i64, is_current: bool) -> MatchweekPointer {
        MatchweekPointer {
            league: league.into(),
            matchweek_number: week,
            is_current,
        }
    }

    pub(crate) fn sample_store() -> MemoryStore {
        MemoryStore::new(
            vec![
                fixture("late", 9, "man_utd", "wolves", t0() + Duration::hours(2)),
                fixture("early", 9, "chelsea", "arsenal", t0()),
                fixture("mid", 9, "man_city", "nottm_forest", t0() + Duration::hours(1)),
                fixture("last-week", 8, "chelsea", "liverpool", t0() - Duration::days(7)),
            ],
            vec![
                pointer("premier_league", 8, false),
                pointer("premier_league", 9, true),
            ],
        )
    }

    fn input(league: &str) -> ToolCallInput {
        ToolCallInput {
            league: league.into(),
            ..ToolCallInput::default()
        }
    }

    fn ids(resolved: &ResolvedQuery) -> Vec<&str> {
        resolved.matches.iter().map(|m| m.match_id.as_str()).collect()
    }

    #[tokio::test]
    async fn defaults_to_current_matchweek_sorted_by_kickoff() {
        let resolved = resolve_predictions(&sample_store(), &input("EPL")).await.unwrap();
        assert_eq!(resolved.league, "premier_league");
        assert_eq!(resolved.matchweek, 9);
        assert_eq!(ids(&resolved), vec!["early", "mid", "late"]);
    }

    #[tokio::test]
    async fn explicit_matchweek_skips_pointer_lookup() {
        let store = MemoryStore::new(
            vec![fixture("old", 8, "chelsea", "liverpool", t0())],
            Vec::new(),
        );
        let query = ToolCallInput {
            matchweek: Some(8),
            ..input("pl")
        };
        let resolved = resolve_predictions(&store, &query).await.unwrap();
        assert_eq!(ids(&resolved), vec!["old"]);
    }

    #[tokio::test]
    async fn equal_kickoffs_keep_source_order() {
        let store = MemoryStore::new(
            vec![
                fixture("b", 1, "chelsea", "arsenal", t0()),
                fixture("a", 1, "everton", "fulham", t0()),
                fixture("c", 1, "brighton", "brentford", t0() - Duration::hours(1)),
            ],
            vec![pointer("premier_league", 1, true)],
        );
        let resolved = resolve_predictions(&store, &input("premier_league")).await.unwrap();
        assert_eq!(ids(&resolved), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn team_filters_use_aliases_and_substrings() {
        let store = sample_store();

        let query = ToolCallInput {
            home_team: Some("Manchester United".into()),
            ..input("epl")
        };
        let resolved = resolve_predictions(&store, &query).await.unwrap();
        assert_eq!(ids(&resolved), vec!["late"]);

        let query = ToolCallInput {
            home_team: Some("man".into()),
            ..input("epl")
        };
        let resolved = resolve_predictions(&store, &query).await.unwrap();
        assert_eq!(ids(&resolved), vec!["mid", "late"]);

        let query = ToolCallInput {
            home_team: Some("man".into()),
            away_team: Some("Forest".into()),
            ..input("epl")
        };
        let resolved = resolve_predictions(&store, &query).await.unwrap();
        assert_eq!(ids(&resolved), vec!["mid"]);
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let query = ToolCallInput {
            away_team: Some("barca".into()),
            ..input("epl")
        };
        let err = resolve_predictions(&sample_store(), &query).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No matches found for premier_league matchweek 9"
        );
    }

    #[tokio::test]
    async fn highest_of_several_current_pointers_wins() {
        let store = MemoryStore::new(
            vec![
                fixture("week-9", 9, "chelsea", "arsenal", t0()),
                fixture("week-10", 10, "everton", "fulham", t0() + Duration::days(7)),
            ],
            vec![
                pointer("premier_league", 10, true),
                pointer("premier_league", 9, true),
                pointer("la_liga", 30, true),
            ],
        );
        let resolved = resolve_predictions(&store, &input("pl")).await.unwrap();
        assert_eq!(resolved.matchweek, 10);
        assert_eq!(ids(&resolved), vec!["week-10"]);
    }

    #[tokio::test]
    async fn missing_pointer_is_not_found() {
        let err = resolve_predictions(&sample_store(), &input("UCL"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::NoCurrentMatchweek { ref league } if league == "champions_league"));
        assert_eq!(err.to_string(), "No current matchweek found for champions_league");
    }

    struct FailingStore;

    #[async_trait]
    impl MatchStore for FailingStore {
        async fn matches_by_league(&self, _league: &str) -> Result<Vec<Match>, StoreError> {
            Err(StoreError::Decode {
                field: "kickoff_time",
                key: "premier_league/x".into(),
                message: "bad".into(),
            })
        }

        async fn current_matchweeks(&self) -> Result<Vec<MatchweekPointer>, StoreError> {
            Ok(vec![pointer("premier_league", 1, true)])
        }
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let err = resolve_predictions(&FailingStore, &input("pl")).await.unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }

    #[test]
    fn parses_arguments() {
        let parsed = ToolCallInput::from_arguments(&json!({
            "league": "EPL",
            "matchweek": 12.0,
            "home_team": "chelsea",
            "away_team": ""
        }))
        .unwrap();
        assert_eq!(
            parsed,
            ToolCallInput {
                league: "EPL".into(),
                matchweek: Some(12),
                home_team: Some("chelsea".into()),
                away_team: None,
            }
        );

        let parsed = ToolCallInput::from_arguments(&json!({"league": "pl", "matchweek": 0})).unwrap();
        assert_eq!(parsed.matchweek, None);

        let parsed = ToolCallInput::from_arguments(&json!({"league": "pl", "matchweek": "7"})).unwrap();
        assert_eq!(parsed.matchweek, Some(7));
    }

    #[test]
    fn rejects_bad_arguments() {
        for args in [
            json!({}),
            json!(null),
            json!({"league": 5}),
            json!({"league": "  "}),
            json!({"league": "pl", "matchweek": 1.5}),
            json!({"league": "pl", "matchweek": "next"}),
            json!({"league": "pl", "home_team": 3}),
            json!(["pl"]),
        ] {
            let err = ToolCallInput::from_arguments(&args).unwrap_err();
            assert!(matches!(err, QueryError::InvalidArguments(_)), "args {args}");
        }
    }
}
