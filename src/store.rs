use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use tokio::task;
use tracing::debug;

use crate::{
    error::StoreError,
    models::{Match, MatchweekPointer},
};

/// Read-only view over the two collections the resolver consults.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Every match of one league, in no particular order.
    async fn matches_by_league(&self, league: &str) -> Result<Vec<Match>, StoreError>;

    /// Every matchweek pointer flagged as current, across all leagues,
    /// ordered by league and then by matchweek number, highest first.
    async fn current_matchweeks(&self) -> Result<Vec<MatchweekPointer>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct TableNames {
    pub matches: String,
    pub matchweeks: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            matches: "matches".to_string(),
            matchweeks: "matchweeks".to_string(),
        }
    }
}

pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    tables: Arc<TableNames>,
}

struct MatchRow {
    league: String,
    match_id: String,
    matchweek: i64,
    home_club_id: String,
    away_club_id: String,
    kickoff_time: String,
    predictions: Option<String>,
    key_players: Option<String>,
}

impl SqliteStore {
    pub fn open(path: &Path, tables: TableNames) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, tables)
    }

    pub fn open_in_memory(tables: TableNames) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, tables)
    }

    fn from_connection(conn: Connection, tables: TableNames) -> Result<Self, StoreError> {
        ensure_schema(&conn, &tables)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            tables: Arc::new(tables),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &TableNames) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let tables = self.tables.clone();
        task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            op(&guard, tables.as_ref())
        })
        .await?
    }
}

fn ensure_schema(conn: &Connection, tables: &TableNames) -> Result<(), StoreError> {
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {matches} (
            league TEXT NOT NULL,
            match_id TEXT NOT NULL,
            matchweek INTEGER NOT NULL,
            home_club_id TEXT NOT NULL,
            away_club_id TEXT NOT NULL,
            kickoff_time TEXT NOT NULL,
            predictions TEXT,
            key_players TEXT,
            PRIMARY KEY (league, match_id)
        );
        CREATE TABLE IF NOT EXISTS {matchweeks} (
            league TEXT NOT NULL,
            matchweek_number INTEGER NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (league, matchweek_number)
        );
        ",
        matches = tables.matches,
        matchweeks = tables.matchweeks,
    ))?;
    Ok(())
}

#[async_trait]
impl MatchStore for SqliteStore {
    async fn matches_by_league(&self, league: &str) -> Result<Vec<Match>, StoreError> {
        let league = league.to_string();
        self.with_conn(move |conn, tables| {
            let mut stmt = conn.prepare(&format!(
                "SELECT league,match_id,matchweek,home_club_id,away_club_id,kickoff_time,predictions,key_players FROM {} WHERE league = ?1",
                tables.matches
            ))?;
            let rows = stmt.query_map(params![league], |row| {
                Ok(MatchRow {
                    league: row.get(0)?,
                    match_id: row.get(1)?,
                    matchweek: row.get(2)?,
                    home_club_id: row.get(3)?,
                    away_club_id: row.get(4)?,
                    kickoff_time: row.get(5)?,
                    predictions: row.get(6)?,
                    key_players: row.get(7)?,
                })
            })?;

            let mut matches = Vec::new();
            for row in rows {
                matches.push(decode_match(row?)?);
            }
            debug!(league = %league, rows = matches.len(), "Loaded league matches");
            Ok(matches)
        })
        .await
    }

    async fn current_matchweeks(&self) -> Result<Vec<MatchweekPointer>, StoreError> {
        self.with_conn(|conn, tables| {
            let mut stmt = conn.prepare(&format!(
                "SELECT league,matchweek_number,is_current FROM {} WHERE is_current = 1 ORDER BY league ASC, matchweek_number DESC",
                tables.matchweeks
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok(MatchweekPointer {
                    league: row.get(0)?,
                    matchweek_number: row.get(1)?,
                    is_current: row.get(2)?,
                })
            })?;

            let mut pointers = Vec::new();
            for row in rows {
                pointers.push(row?);
            }
            Ok(pointers)
        })
        .await
    }
}

fn decode_match(row: MatchRow) -> Result<Match, StoreError> {
    let key = format!("{}/{}", row.league, row.match_id);
    let kickoff_time = DateTime::parse_from_rfc3339(&row.kickoff_time)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::Decode {
            field: "kickoff_time",
            key: key.clone(),
            message: err.to_string(),
        })?;

    Ok(Match {
        predictions: decode_json_column("predictions", &key, row.predictions.as_deref())?,
        key_players: decode_json_column("key_players", &key, row.key_players.as_deref())?,
        league: row.league,
        match_id: row.match_id,
        matchweek: row.matchweek,
        home_club_id: row.home_club_id,
        away_club_id: row.away_club_id,
        kickoff_time,
    })
}

fn decode_json_column<T>(field: &'static str, key: &str, raw: Option<&str>) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(T::default());
    };

    serde_json::from_str::<Option<T>>(raw)
        .map(Option::unwrap_or_default)
        .map_err(|err| StoreError::Decode {
            field,
            key: key.to_string(),
            message: err.to_string(),
        })
}

/// Fixture-backed store; lookups behave like the SQLite tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    matches: Vec<Match>,
    matchweeks: Vec<MatchweekPointer>,
}

impl MemoryStore {
    pub fn new(matches: Vec<Match>, matchweeks: Vec<MatchweekPointer>) -> Self {
        Self {
            matches,
            matchweeks,
        }
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn matches_by_league(&self, league: &str) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.league == league)
            .cloned()
            .collect())
    }

    async fn current_matchweeks(&self) -> Result<Vec<MatchweekPointer>, StoreError> {
        let mut pointers: Vec<MatchweekPointer> = self
            .matchweeks
            .iter()
            .filter(|mw| mw.is_current)
            .cloned()
            .collect();
        pointers.sort_by(|a, b| {
            a.league
                .cmp(&b.league)
                .then(b.matchweek_number.cmp(&a.matchweek_number))
        });
        Ok(pointers)
    }
}
