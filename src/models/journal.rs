use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MOOD_MIN: i32 = 1;
pub const MOOD_MAX: i32 = 5;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub date: String,
    pub title: String,
    pub content: String,
    pub mood: i32,
    #[serde(default)]
    pub photos: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One journal per (user, trip) pair, created lazily on first access.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Journal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub trip_id: ObjectId,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewJournal {
    pub trip_id: ObjectId,
}

#[derive(Debug, Deserialize)]
pub struct EntryInput {
    pub date: String,
    pub title: String,
    pub content: String,
    pub mood: i32,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl EntryInput {
    /// Field-level validation message, or None when the entry is acceptable.
    pub fn validate(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("Entry title must not be empty");
        }
        if self.mood < MOOD_MIN || self.mood > MOOD_MAX {
            return Some("Mood must be between 1 and 5");
        }
        None
    }
}
