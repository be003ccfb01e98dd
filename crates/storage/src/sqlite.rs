//! SQLite Event Store
//!
//! The (event_type, start_time) pair carries a UNIQUE constraint; inserts use
//! `ON CONFLICT DO NOTHING` followed by a keyed select, so concurrent
//! ingestions of the same storm never produce duplicates.

use crate::model::{EventAttributes, EventType, NewStory, StormEvent, UserStory};
use crate::store::{key_time, EventStore};
use crate::StorageError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed-width UTC format at microsecond resolution; lexical order equals
/// chronological order
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const EVENT_COLUMNS: &str = "id, event_type, start_time, max_kp_index, solar_wind_speed, bz_gsm";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLx connection URL
    pub url: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://aurora-watch.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Event store backed by SQLite
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Open (creating if needed) the configured database and apply the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %config.url, "Opened event database");
        Self::with_pool(pool).await
    }

    /// Private in-memory database on a single long-lived connection
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and apply the schema
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables if they do not exist (idempotent)
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS storm_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                start_time TEXT NOT NULL,
                max_kp_index REAL,
                solar_wind_speed REAL,
                bz_gsm REAL,
                UNIQUE (event_type, start_time)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_stories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id INTEGER NOT NULL REFERENCES storm_events(id) ON DELETE CASCADE,
                author_name TEXT NOT NULL DEFAULT 'Anonymous',
                story_text TEXT NOT NULL,
                submission_time TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_stories_event
                ON user_stories (event_id, submission_time)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Event schema ready");
        Ok(())
    }

    async fn find_by_key(
        &self,
        event_type: EventType,
        start_time: &str,
    ) -> Result<StormEvent, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM storm_events WHERE event_type = ? AND start_time = ?",
            EVENT_COLUMNS
        ))
        .bind(event_type.as_str())
        .bind(start_time)
        .fetch_one(&self.pool)
        .await?;

        event_from_row(&row)
    }
}

impl EventStore for SqliteEventStore {
    async fn ensure_event(
        &self,
        event_type: EventType,
        start_time: DateTime<Utc>,
        attributes: EventAttributes,
    ) -> Result<(StormEvent, bool), StorageError> {
        let key = encode_time(&key_time(start_time));

        let result = sqlx::query(
            "INSERT INTO storm_events
                (event_type, start_time, max_kp_index, solar_wind_speed, bz_gsm)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (event_type, start_time) DO NOTHING",
        )
        .bind(event_type.as_str())
        .bind(&key)
        .bind(attributes.max_kp_index)
        .bind(attributes.solar_wind_speed)
        .bind(attributes.bz_gsm)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        let event = self.find_by_key(event_type, &key).await?;
        debug!(id = event.id, created, "Ensured event");

        Ok((event, created))
    }

    async fn list_events(&self) -> Result<Vec<StormEvent>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM storm_events ORDER BY start_time DESC, id DESC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }

    async fn get_event(&self, id: i64) -> Result<StormEvent, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM storm_events WHERE id = ?",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        event_from_row(&row)
    }

    async fn add_story(&self, event_id: i64, story: NewStory) -> Result<UserStory, StorageError> {
        let (author_name, story_text) = story.validate()?;

        // Surface a missing event as NotFound rather than a foreign key failure
        self.get_event(event_id).await?;

        let submission_time = Utc::now();
        let result = sqlx::query(
            "INSERT INTO user_stories (event_id, author_name, story_text, submission_time)
             VALUES (?, ?, ?, ?)",
        )
        .bind(event_id)
        .bind(&author_name)
        .bind(&story_text)
        .bind(encode_time(&submission_time))
        .execute(&self.pool)
        .await?;

        Ok(UserStory {
            id: result.last_insert_rowid(),
            event_id,
            author_name,
            story_text,
            submission_time: decode_time(&encode_time(&submission_time))?,
        })
    }

    async fn list_stories(&self, event_id: i64) -> Result<Vec<UserStory>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, event_id, author_name, story_text, submission_time
             FROM user_stories
             WHERE event_id = ?
             ORDER BY submission_time DESC, id DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(story_from_row).collect()
    }

    async fn event_count(&self) -> Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storm_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

fn encode_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| StorageError::SerializationError(format!("bad timestamp {}: {}", raw, e)))
}

fn event_from_row(row: &SqliteRow) -> Result<StormEvent, StorageError> {
    let event_type: String = row.try_get("event_type")?;
    let start_time: String = row.try_get("start_time")?;

    Ok(StormEvent {
        id: row.try_get("id")?,
        event_type: event_type.parse()?,
        start_time: decode_time(&start_time)?,
        max_kp_index: row.try_get("max_kp_index")?,
        solar_wind_speed: row.try_get("solar_wind_speed")?,
        bz_gsm: row.try_get("bz_gsm")?,
    })
}

fn story_from_row(row: &SqliteRow) -> Result<UserStory, StorageError> {
    let submission_time: String = row.try_get("submission_time")?;

    Ok(UserStory {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        author_name: row.try_get("author_name")?,
        story_text: row.try_get("story_text")?,
        submission_time: decode_time(&submission_time)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_AUTHOR;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn kp(value: f64) -> EventAttributes {
        EventAttributes {
            max_kp_index: Some(value),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sub_microsecond_start_times_share_a_key() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let base = at(10, 18);
        let first = base + chrono::Duration::nanoseconds(123_456_789);
        let second = base + chrono::Duration::nanoseconds(123_456_001);

        let (event, created) = store
            .ensure_event(EventType::GeomagneticStorm, first, kp(7.0))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(event.start_time, base + chrono::Duration::microseconds(123_456));

        let (again, created) = store
            .ensure_event(EventType::GeomagneticStorm, second, kp(7.0))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, event.id);
    }

    #[test]
    fn test_time_encoding_is_sortable() {
        let early = encode_time(&at(9, 23));
        let late = encode_time(&at(10, 1));
        assert!(early < late);
        assert_eq!(decode_time(&late).unwrap(), at(10, 1));
    }

    #[tokio::test]
    async fn test_ensure_event_creates_once() {
        let store = SqliteEventStore::in_memory().await.unwrap();

        let (event, created) = store
            .ensure_event(EventType::GeomagneticStorm, at(10, 18), kp(8.67))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(event.max_kp_index, Some(8.67));
        assert_eq!(event.start_time, at(10, 18));

        let (again, created) = store
            .ensure_event(EventType::GeomagneticStorm, at(10, 18), kp(9.0))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again, event);
        assert_eq!(store.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_creates_one_record() {
        let store = SqliteEventStore::in_memory().await.unwrap();

        let (a, b) = tokio::join!(
            store.ensure_event(EventType::GeomagneticStorm, at(10, 18), kp(8.0)),
            store.ensure_event(EventType::GeomagneticStorm, at(10, 18), kp(8.0)),
        );
        let (a, created_a) = a.unwrap();
        let (b, created_b) = b.unwrap();

        assert_eq!(a.id, b.id);
        assert!(created_a ^ created_b);
        assert_eq!(store.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_events_ordering() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        for (day, hour) in [(9, 12), (11, 3), (10, 21)] {
            store
                .ensure_event(EventType::GeomagneticStorm, at(day, hour), kp(5.0))
                .await
                .unwrap();
        }

        let times: Vec<_> = store
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.start_time)
            .collect();
        assert_eq!(times, vec![at(11, 3), at(10, 21), at(9, 12)]);
    }

    #[tokio::test]
    async fn test_get_event_not_found() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get_event(99).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_stories_round_trip() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let (event, _) = store
            .ensure_event(EventType::GeomagneticStorm, at(10, 18), kp(8.67))
            .await
            .unwrap();

        let first = store
            .add_story(
                event.id,
                NewStory {
                    author_name: None,
                    story_text: "Pink overhead at midnight".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(first.author_name, DEFAULT_AUTHOR);

        store
            .add_story(
                event.id,
                NewStory {
                    author_name: Some("Mika".to_string()),
                    story_text: "Corona visible from the city".to_string(),
                },
            )
            .await
            .unwrap();

        let stories = store.list_stories(event.id).await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].author_name, "Mika");
        assert_eq!(stories[1].id, first.id);
    }

    #[tokio::test]
    async fn test_story_for_missing_event() {
        let store = SqliteEventStore::in_memory().await.unwrap();
        let err = store
            .add_story(
                7,
                NewStory {
                    author_name: None,
                    story_text: "Where is this?".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
