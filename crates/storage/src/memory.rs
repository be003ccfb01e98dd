//! In-Memory Event Store

use crate::model::{EventAttributes, EventType, NewStory, StormEvent, UserStory};
use crate::store::{key_time, EventStore};
use crate::StorageError;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<StormEvent>,
    stories: Vec<UserStory>,
    next_event_id: i64,
    next_story_id: i64,
}

/// Event store held in process memory
///
/// A single mutex guards all state, which makes get-or-create atomic.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    state: Mutex<MemoryState>,
}

impl MemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory event store");
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }
}

impl EventStore for MemoryEventStore {
    async fn ensure_event(
        &self,
        event_type: EventType,
        start_time: DateTime<Utc>,
        attributes: EventAttributes,
    ) -> Result<(StormEvent, bool), StorageError> {
        let start_time = key_time(start_time);
        let mut state = self.lock()?;

        if let Some(existing) = state
            .events
            .iter()
            .find(|e| e.event_type == event_type && e.start_time == start_time)
        {
            return Ok((existing.clone(), false));
        }

        state.next_event_id += 1;
        let event = StormEvent {
            id: state.next_event_id,
            event_type,
            start_time,
            max_kp_index: attributes.max_kp_index,
            solar_wind_speed: attributes.solar_wind_speed,
            bz_gsm: attributes.bz_gsm,
        };
        state.events.push(event.clone());
        debug!(id = event.id, "Inserted event");

        Ok((event, true))
    }

    async fn list_events(&self) -> Result<Vec<StormEvent>, StorageError> {
        let state = self.lock()?;
        let mut events = state.events.clone();
        events.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn get_event(&self, id: i64) -> Result<StormEvent, StorageError> {
        let state = self.lock()?;
        state
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn add_story(&self, event_id: i64, story: NewStory) -> Result<UserStory, StorageError> {
        let (author_name, story_text) = story.validate()?;
        let mut state = self.lock()?;

        if !state.events.iter().any(|e| e.id == event_id) {
            return Err(StorageError::NotFound);
        }

        state.next_story_id += 1;
        let story = UserStory {
            id: state.next_story_id,
            event_id,
            author_name,
            story_text,
            submission_time: Utc::now(),
        };
        state.stories.push(story.clone());

        Ok(story)
    }

    async fn list_stories(&self, event_id: i64) -> Result<Vec<UserStory>, StorageError> {
        let state = self.lock()?;
        let mut stories: Vec<_> = state
            .stories
            .iter()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        stories.sort_by(|a, b| {
            b.submission_time
                .cmp(&a.submission_time)
                .then(b.id.cmp(&a.id))
        });
        Ok(stories)
    }

    async fn event_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, hour, 0, 0).unwrap()
    }

    fn kp(value: f64) -> EventAttributes {
        EventAttributes {
            max_kp_index: Some(value),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_event_is_idempotent() {
        let store = MemoryEventStore::new();

        let (first, created) = store
            .ensure_event(EventType::GeomagneticStorm, at(18), kp(8.67))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = store
            .ensure_event(EventType::GeomagneticStorm, at(18), kp(9.0))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        // Existing record is returned untouched
        assert_eq!(second.max_kp_index, Some(8.67));
        assert_eq!(store.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_time_keyed_at_microseconds() {
        let store = MemoryEventStore::new();
        let (event, _) = store
            .ensure_event(
                EventType::GeomagneticStorm,
                at(18) + chrono::Duration::nanoseconds(1_500),
                kp(6.0),
            )
            .await
            .unwrap();
        assert_eq!(event.start_time, at(18) + chrono::Duration::microseconds(1));

        let (_, created) = store
            .ensure_event(
                EventType::GeomagneticStorm,
                at(18) + chrono::Duration::nanoseconds(1_999),
                kp(6.0),
            )
            .await
            .unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn test_event_type_is_part_of_key() {
        let store = MemoryEventStore::new();
        store
            .ensure_event(EventType::GeomagneticStorm, at(18), kp(6.0))
            .await
            .unwrap();
        let (_, created) = store
            .ensure_event(EventType::SolarFlare, at(18), EventAttributes::default())
            .await
            .unwrap();
        assert!(created);
        assert_eq!(store.event_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_events_newest_first() {
        let store = MemoryEventStore::new();
        for hour in [3, 21, 12] {
            store
                .ensure_event(EventType::GeomagneticStorm, at(hour), kp(5.0))
                .await
                .unwrap();
        }

        let hours: Vec<_> = store
            .list_events()
            .await
            .unwrap()
            .iter()
            .map(|e| e.start_time)
            .collect();
        assert_eq!(hours, vec![at(21), at(12), at(3)]);
    }

    #[tokio::test]
    async fn test_stories_for_unknown_event() {
        let store = MemoryEventStore::new();
        let err = store
            .add_story(
                42,
                NewStory {
                    author_name: None,
                    story_text: "Nothing to see".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_stories_newest_first() {
        let store = MemoryEventStore::new();
        let (event, _) = store
            .ensure_event(EventType::GeomagneticStorm, at(18), kp(8.0))
            .await
            .unwrap();

        for text in ["first", "second"] {
            store
                .add_story(
                    event.id,
                    NewStory {
                        author_name: Some("Ada".to_string()),
                        story_text: text.to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let stories = store.list_stories(event.id).await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].story_text, "second");
    }

    #[tokio::test]
    async fn test_list_events_same_start_newest_id_first() {
        let store = MemoryEventStore::new();
        for event_type in [EventType::GeomagneticStorm, EventType::SolarFlare, EventType::Other] {
            store
                .ensure_event(event_type, at(18), EventAttributes::default())
                .await
                .unwrap();
        }

        let ids: Vec<_> = store
            .list_events()
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
