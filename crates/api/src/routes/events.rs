//! Event and Story Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use storage::{EventStore, NewStory, StormEvent, UserStory};
use tracing::info;

use crate::{error::ApiError, AppState};

/// Event with its display title
#[derive(Debug, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: StormEvent,
    pub title: String,
}

impl From<StormEvent> for EventSummary {
    fn from(event: StormEvent) -> Self {
        Self {
            title: event.to_string(),
            event,
        }
    }
}

/// Response for the events listing
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub data: Vec<EventSummary>,
    pub count: usize,
}

/// Single event with its stories, newest first
#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventSummary,
    pub stories: Vec<UserStory>,
}

/// List all events, newest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventListResponse>, ApiError> {
    let data: Vec<EventSummary> = state
        .store
        .list_events()
        .await?
        .into_iter()
        .map(EventSummary::from)
        .collect();

    Ok(Json(EventListResponse {
        count: data.len(),
        data,
    }))
}

/// Fetch one event
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EventDetailResponse>, ApiError> {
    let event = state.store.get_event(id).await?;
    let stories = state.store.list_stories(id).await?;

    Ok(Json(EventDetailResponse {
        event: event.into(),
        stories,
    }))
}

/// Attach a story to an event
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(story): Json<NewStory>,
) -> Result<(StatusCode, Json<UserStory>), ApiError> {
    let story = state.store.add_story(id, story).await?;
    info!(event_id = id, story_id = story.id, "Story submitted");
    Ok((StatusCode::CREATED, Json(story)))
}
