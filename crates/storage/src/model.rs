//! Stored Records

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author recorded when a story is submitted without a name
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Maximum author name length in characters
pub const MAX_AUTHOR_LEN: usize = 100;

/// Kind of space-weather event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    GeomagneticStorm,
    SolarFlare,
    Other,
}

impl EventType {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::GeomagneticStorm => "GEOMAGNETIC_STORM",
            EventType::SolarFlare => "SOLAR_FLARE",
            EventType::Other => "OTHER",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            EventType::GeomagneticStorm => "Geomagnetic Storm",
            EventType::SolarFlare => "Solar Flare",
            EventType::Other => "Other",
        }
    }
}

impl FromStr for EventType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GEOMAGNETIC_STORM" => Ok(EventType::GeomagneticStorm),
            "SOLAR_FLARE" => Ok(EventType::SolarFlare),
            "OTHER" => Ok(EventType::Other),
            other => Err(StorageError::SerializationError(format!(
                "unknown event type {}",
                other
            ))),
        }
    }
}

/// Optional magnitudes recorded with a new event
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventAttributes {
    pub max_kp_index: Option<f64>,
    pub solar_wind_speed: Option<f64>,
    pub bz_gsm: Option<f64>,
}

/// A recorded geomagnetic disturbance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormEvent {
    pub id: i64,
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub max_kp_index: Option<f64>,
    pub solar_wind_speed: Option<f64>,
    pub bz_gsm: Option<f64>,
}

impl fmt::Display for StormEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.event_type.display_name(),
            self.start_time.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// A visitor's account of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: i64,
    pub event_id: i64,
    pub author_name: String,
    pub story_text: String,
    pub submission_time: DateTime<Utc>,
}

/// Story submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    #[serde(default)]
    pub author_name: Option<String>,
    pub story_text: String,
}

impl NewStory {
    /// Validate and normalize into `(author_name, story_text)`
    pub fn validate(&self) -> Result<(String, String), StorageError> {
        let story_text = self.story_text.trim();
        if story_text.is_empty() {
            return Err(StorageError::InvalidInput(
                "story_text must not be empty".to_string(),
            ));
        }

        let author = self
            .author_name
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR);

        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err(StorageError::InvalidInput(format!(
                "author_name exceeds {} characters",
                MAX_AUTHOR_LEN
            )));
        }

        Ok((author.to_string(), story_text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_type_round_trip() {
        for t in [EventType::GeomagneticStorm, EventType::SolarFlare, EventType::Other] {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert!("AURORA".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_display() {
        let event = StormEvent {
            id: 1,
            event_type: EventType::GeomagneticStorm,
            start_time: Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap(),
            max_kp_index: Some(8.67),
            solar_wind_speed: None,
            bz_gsm: None,
        };
        assert_eq!(event.to_string(), "Geomagnetic Storm - 2024-05-10 18:00:00 UTC");
    }

    #[test]
    fn test_story_defaults_to_anonymous() {
        let story = NewStory {
            author_name: Some("   ".to_string()),
            story_text: "Saw red pillars over the lake".to_string(),
        };
        let (author, _) = story.validate().unwrap();
        assert_eq!(author, DEFAULT_AUTHOR);
    }

    #[test]
    fn test_story_rejects_empty_text() {
        let story = NewStory {
            author_name: None,
            story_text: "  \n".to_string(),
        };
        assert!(matches!(story.validate(), Err(StorageError::InvalidInput(_))));
    }

    #[test]
    fn test_story_rejects_long_author() {
        let story = NewStory {
            author_name: Some("x".repeat(MAX_AUTHOR_LEN + 1)),
            story_text: "Bright green arcs".to_string(),
        };
        assert!(story.validate().is_err());
    }

    #[test]
    fn test_event_type_serializes_screaming_case() {
        let json = serde_json::to_string(&EventType::GeomagneticStorm).unwrap();
        assert_eq!(json, "\"GEOMAGNETIC_STORM\"");
    }
}
