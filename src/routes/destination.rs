use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo;
use crate::middleware::auth_context::{owns_or_admin, CurrentUser};
use crate::models::destination::{mean_rating, Destination, NewReview, Review};
use crate::models::user::UserRole;

#[derive(Debug, Default, Deserialize)]
pub struct DestinationQuery {
    pub country: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Public browsing only ever sees approved destinations; country is a
/// case-insensitive exact match, search a case-insensitive substring match
/// over name and description.
pub fn build_filter(query: &DestinationQuery) -> Document {
    let mut filter = doc! { "is_approved": true };

    if let Some(country) = query.country.as_deref().filter(|c| !c.trim().is_empty()) {
        filter.insert(
            "country",
            doc! { "$regex": format!("^{}$", regex::escape(country.trim())), "$options": "i" },
        );
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = regex::escape(search.trim());
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "description": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

pub fn build_sort(query: &DestinationQuery) -> Document {
    match query.sort.as_deref() {
        Some("rating") => doc! { "rating": -1 },
        Some("popularity") => doc! { "is_popular": -1, "rating": -1 },
        _ => doc! { "name": 1 },
    }
}

pub async fn get_all(
    data: web::Data<Arc<Client>>,
    query: web::Query<DestinationQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let query = query.into_inner();

    let cursor = mongo::destinations(&client)
        .find(build_filter(&query))
        .sort(build_sort(&query))
        .await;

    match cursor {
        Ok(cursor) => match cursor.try_collect::<Vec<Destination>>().await {
            Ok(destinations) => HttpResponse::Ok().json(destinations),
            Err(err) => {
                log::error!("Failed to collect destinations: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to fetch destinations")
            }
        },
        Err(err) => {
            log::error!("Failed to query destinations: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch destinations")
        }
    }
}

pub async fn get_by_id(data: web::Data<Arc<Client>>, path: web::Path<String>) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let client = data.into_inner();
    match mongo::destinations(&client).find_one(doc! { "_id": id }).await {
        Ok(Some(destination)) => HttpResponse::Ok().json(destination),
        Ok(None) => HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to fetch destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch destination")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewDestination {
    pub name: String,
    pub description: String,
    pub country: String,
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    pub best_season: Option<String>,
    #[serde(default)]
    pub popular_attractions: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}

// Admin-only; the RequireRole wrapper enforces the role before we get here.
pub async fn create(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<NewDestination>,
) -> impl Responder {
    let input = input.into_inner();

    for (field, value) in [
        ("name", &input.name),
        ("description", &input.description),
        ("country", &input.country),
    ] {
        if value.trim().is_empty() {
            return HttpResponse::BadRequest()
                .json(json!({ "field": field, "message": format!("{} must not be empty", field) }));
        }
    }

    let now = Utc::now();
    let destination = Destination {
        id: None,
        name: input.name,
        description: input.description,
        country: input.country,
        location: input.location,
        images: input.images,
        activities: input.activities,
        best_season: input.best_season,
        popular_attractions: input.popular_attractions,
        is_popular: input.is_popular,
        is_approved: true,
        added_by: Some(user.id),
        approved_by: Some(user.id),
        rating: 0.0,
        reviews: vec![],
        created_at: Some(now),
        updated_at: Some(now),
    };

    let client = data.into_inner();
    match mongo::destinations(&client).insert_one(&destination).await {
        Ok(result) => {
            let mut stored = destination;
            stored.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(stored)
        }
        Err(err) => {
            log::error!("Failed to insert destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create destination")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDestination {
    pub name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub images: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
    pub best_season: Option<String>,
    pub popular_attractions: Option<Vec<String>>,
    pub is_popular: Option<bool>,
}

fn can_modify(destination: &Destination, user: &CurrentUser) -> bool {
    match &destination.added_by {
        Some(owner) => owns_or_admin(owner, user),
        None => user.role == UserRole::Admin,
    }
}

pub async fn update(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<UpdateDestination>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let client = data.into_inner();
    let collection = mongo::destinations(&client);

    let destination = match collection.find_one(doc! { "_id": id }).await {
        Ok(Some(destination)) => destination,
        Ok(None) => return HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to fetch destination: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to update destination");
        }
    };
    if !can_modify(&destination, &user) {
        return HttpResponse::Forbidden().body("Not allowed to modify this destination");
    }

    let input = input.into_inner();
    let mut set = doc! { "updated_at": Utc::now().to_rfc3339() };
    if let Some(name) = input.name {
        set.insert("name", name);
    }
    if let Some(description) = input.description {
        set.insert("description", description);
    }
    if let Some(country) = input.country {
        set.insert("country", country);
    }
    if let Some(location) = input.location {
        set.insert("location", location);
    }
    if let Some(images) = input.images {
        set.insert("images", images);
    }
    if let Some(activities) = input.activities {
        set.insert("activities", activities);
    }
    if let Some(best_season) = input.best_season {
        set.insert("best_season", best_season);
    }
    if let Some(popular_attractions) = input.popular_attractions {
        set.insert("popular_attractions", popular_attractions);
    }
    if let Some(is_popular) = input.is_popular {
        set.insert("is_popular", is_popular);
    }

    match collection
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Destination updated"),
        Err(err) => {
            log::error!("Failed to update destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update destination")
        }
    }
}

pub async fn delete(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let client = data.into_inner();
    let collection = mongo::destinations(&client);

    let destination = match collection.find_one(doc! { "_id": id }).await {
        Ok(Some(destination)) => destination,
        Ok(None) => return HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to fetch destination: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to delete destination");
        }
    };
    if !can_modify(&destination, &user) {
        return HttpResponse::Forbidden().body("Not allowed to delete this destination");
    }

    match collection.delete_one(doc! { "_id": id }).await {
        Ok(_) => HttpResponse::Ok().body("Destination deleted"),
        Err(err) => {
            log::error!("Failed to delete destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to delete destination")
        }
    }
}

pub async fn add_review(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<NewReview>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let input = input.into_inner();
    if !(1.0..=5.0).contains(&input.rating) {
        return HttpResponse::BadRequest()
            .json(json!({ "field": "rating", "message": "Rating must be between 1 and 5" }));
    }

    let client = data.into_inner();
    let collection = mongo::destinations(&client);

    let destination = match collection.find_one(doc! { "_id": id }).await {
        Ok(Some(destination)) => destination,
        Ok(None) => return HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to fetch destination: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to add review");
        }
    };

    if destination.reviews.iter().any(|r| r.user == user.id) {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "You have already reviewed this destination" }));
    }

    let review = Review {
        user: user.id,
        rating: input.rating,
        comment: input.comment,
        created_at: Some(Utc::now()),
    };

    // Push and recompute the mean in one update; concurrent reviews are
    // last-write-wins, which is acceptable at this contention level.
    let mut reviews = destination.reviews.clone();
    reviews.push(review.clone());
    let rating = mean_rating(&reviews);

    let review_bson = match mongodb::bson::to_bson(&review) {
        Ok(bson) => bson,
        Err(err) => {
            log::error!("Failed to serialize review: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to add review");
        }
    };

    let update = doc! {
        "$push": { "reviews": review_bson },
        "$set": { "rating": rating, "updated_at": Utc::now().to_rfc3339() },
    };

    match collection.update_one(doc! { "_id": id }, update).await {
        Ok(_) => HttpResponse::Created().json(json!({ "rating": rating, "review": review })),
        Err(err) => {
            log::error!("Failed to add review: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to add review")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_only_shows_approved() {
        let filter = build_filter(&DestinationQuery::default());
        assert_eq!(filter, doc! { "is_approved": true });
    }

    #[test]
    fn search_matches_name_and_description_case_insensitively() {
        let query = DestinationQuery {
            search: Some("bali".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&query);
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let name_clause = clauses[0].as_document().unwrap();
        let regex = name_clause.get_document("name").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "bali");
        assert_eq!(regex.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn search_input_is_regex_escaped() {
        let query = DestinationQuery {
            search: Some("a.b*".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&query);
        let clauses = filter.get_array("$or").unwrap();
        let regex = clauses[0]
            .as_document()
            .unwrap()
            .get_document("name")
            .unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), regex::escape("a.b*"));
    }

    #[test]
    fn country_filter_is_exact_case_insensitive() {
        let query = DestinationQuery {
            country: Some(" Japan ".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&query);
        let regex = filter.get_document("country").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), "^Japan$");
    }

    #[test]
    fn sort_defaults_to_name() {
        assert_eq!(build_sort(&DestinationQuery::default()), doc! { "name": 1 });
        let query = DestinationQuery {
            sort: Some("rating".to_string()),
            ..Default::default()
        };
        assert_eq!(build_sort(&query), doc! { "rating": -1 });
        let query = DestinationQuery {
            sort: Some("popularity".to_string()),
            ..Default::default()
        };
        assert_eq!(
            build_sort(&query),
            doc! { "is_popular": -1, "rating": -1 }
        );
    }

    #[test]
    fn blank_query_params_are_ignored() {
        let query = DestinationQuery {
            country: Some("  ".to_string()),
            search: Some("".to_string()),
            sort: None,
        };
        assert_eq!(build_filter(&query), doc! { "is_approved": true });
    }
}
