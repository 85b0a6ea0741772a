use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Review {
    pub user: ObjectId,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Destination {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_season: Option<String>,
    #[serde(default)]
    pub popular_attractions: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_approved: bool,
    pub added_by: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<ObjectId>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub rating: f64,
    pub comment: Option<String>,
}

/// Arithmetic mean of review ratings; zero when there are none.
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64
}
