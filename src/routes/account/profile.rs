use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Client;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo;
use crate::middleware::auth_context::CurrentUser;
use crate::models::destination::Destination;
use crate::models::trip::Trip;
use crate::models::user::{ChangePasswordRequest, UpdateProfileRequest, UserResponse};
use crate::services::account_service::{hash_password, verify_password, MIN_PASSWORD_LENGTH};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub saved_destinations: Vec<Destination>,
    pub trip_history: Vec<Trip>,
}

pub async fn get_profile(user: CurrentUser, data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();

    let record = match mongo::users(&client).find_one(doc! { "_id": user.id }).await {
        Ok(Some(record)) => record,
        Ok(None) => return HttpResponse::NotFound().body("User not found"),
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch profile");
        }
    };

    let saved_destinations = match mongo::destinations(&client)
        .find(doc! { "_id": { "$in": record.saved_destinations.clone() } })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Destination>>().await {
            Ok(destinations) => destinations,
            Err(err) => {
                log::error!("Failed to collect saved destinations: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to fetch profile");
            }
        },
        Err(err) => {
            log::error!("Failed to fetch saved destinations: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch profile");
        }
    };

    let trips = match mongo::trips(&client)
        .find(doc! { "_id": { "$in": record.trip_history.clone() } })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(trips) => trips,
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to fetch profile");
            }
        },
        Err(err) => {
            log::error!("Failed to fetch trips: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch profile");
        }
    };

    // $in does not preserve order; put trips back in trip_history order.
    let history_order = record.trip_history.clone();
    let mut trip_history: Vec<Trip> = Vec::with_capacity(trips.len());
    for id in &history_order {
        if let Some(trip) = trips.iter().find(|t| t.id.as_ref() == Some(id)) {
            trip_history.push(trip.clone());
        }
    }

    HttpResponse::Ok().json(ProfileResponse {
        user: UserResponse::from(record),
        saved_destinations,
        trip_history,
    })
}

pub async fn update_profile(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    let mut set = doc! { "updated_at": Utc::now().to_rfc3339() };

    if let Some(username) = &input.username {
        if username.trim().is_empty() {
            return HttpResponse::BadRequest()
                .json(json!({ "field": "username", "message": "Username must not be empty" }));
        }
        match mongo::users(&client)
            .find_one(doc! { "username": username, "_id": { "$ne": user.id } })
            .await
        {
            Ok(Some(_)) => {
                return HttpResponse::BadRequest()
                    .json(json!({ "field": "username", "message": "Username already taken" }))
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("Failed to check username: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to update profile");
            }
        }
        set.insert("username", username);
    }
    if let Some(bio) = &input.bio {
        set.insert("bio", bio);
    }
    if let Some(picture) = &input.profile_picture {
        set.insert("profile_picture", picture);
    }

    match mongo::users(&client)
        .update_one(doc! { "_id": user.id }, doc! { "$set": set })
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Profile updated"),
        Err(err) => {
            log::error!("Failed to update profile: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update profile")
        }
    }
}

pub async fn change_password(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    if input.new_password.len() < MIN_PASSWORD_LENGTH {
        return HttpResponse::BadRequest().json(json!({
            "field": "new_password",
            "message": format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH)
        }));
    }

    let record = match mongo::users(&client).find_one(doc! { "_id": user.id }).await {
        Ok(Some(record)) => record,
        Ok(None) => return HttpResponse::NotFound().body("User not found"),
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to change password");
        }
    };

    let current_hash = match &record.password {
        Some(hash) => hash,
        // Google-only account; there is no password to change.
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "Password login is not enabled for this account" }))
        }
    };
    if !verify_password(&input.current_password, current_hash) {
        return HttpResponse::BadRequest()
            .json(json!({ "field": "current_password", "message": "Current password is incorrect" }));
    }

    let hashed = match hash_password(&input.new_password) {
        Ok(hashed) => hashed,
        Err(err) => {
            log::error!("Password hashing failed: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to change password");
        }
    };

    match mongo::users(&client)
        .update_one(doc! { "_id": user.id }, doc! { "$set": { "password": hashed } })
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Password changed"),
        Err(err) => {
            log::error!("Failed to change password: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to change password")
        }
    }
}
