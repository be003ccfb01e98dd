//! Persistence Gateway Trait

use crate::model::{EventAttributes, EventType, NewStory, StormEvent, UserStory};
use crate::StorageError;
use chrono::{DateTime, SubsecRound, Utc};
use std::future::Future;

/// Sub-second digits kept for event start times
pub const START_TIME_PRECISION: u16 = 6;

/// Truncate a start time to the resolution events are keyed at
pub(crate) fn key_time(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(START_TIME_PRECISION)
}

/// Storage for storm events and their stories
///
/// `ensure_event` must be atomic: concurrent calls with the same
/// (event type, start time) create at most one record.
pub trait EventStore: Send + Sync {
    /// Return the event keyed on `(event_type, start_time)`, creating it with
    /// `attributes` if absent. The flag is `true` when a record was created.
    /// Start times are keyed and stored at microsecond resolution.
    fn ensure_event(
        &self,
        event_type: EventType,
        start_time: DateTime<Utc>,
        attributes: EventAttributes,
    ) -> impl Future<Output = Result<(StormEvent, bool), StorageError>> + Send;

    /// All events, newest start time first
    fn list_events(&self) -> impl Future<Output = Result<Vec<StormEvent>, StorageError>> + Send;

    /// A single event by id
    fn get_event(&self, id: i64) -> impl Future<Output = Result<StormEvent, StorageError>> + Send;

    /// Attach a story to an event
    fn add_story(
        &self,
        event_id: i64,
        story: NewStory,
    ) -> impl Future<Output = Result<UserStory, StorageError>> + Send;

    /// Stories for an event, newest submission first
    fn list_stories(
        &self,
        event_id: i64,
    ) -> impl Future<Output = Result<Vec<UserStory>, StorageError>> + Send;

    /// Number of stored events
    fn event_count(&self) -> impl Future<Output = Result<usize, StorageError>> + Send;
}
