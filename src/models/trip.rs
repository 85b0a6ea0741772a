use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl Default for TripStatus {
    fn default() -> Self {
        TripStatus::Upcoming
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItineraryDay {
    pub day: i32,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub destination_id: ObjectId,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: TripStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewTrip {
    pub destination_id: ObjectId,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<TripStatus>,
}

/// Full-document update; whatever the client sends replaces the stored trip,
/// last write wins.
#[derive(Debug, Deserialize)]
pub struct UpdateTrip {
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<TripStatus>,
}
