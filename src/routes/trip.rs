use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use bson::doc;
use bson::oid::ObjectId;
use mongodb::Client;
use std::sync::Arc;

use crate::db::mongo;
use crate::middleware::auth_context::{owns, CurrentUser};
use crate::models::trip::{NewTrip, Trip, TripStatus, UpdateTrip};

pub async fn get_all(user: CurrentUser, data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();

    let cursor = mongo::trips(&client)
        .find(doc! { "user_id": user.id })
        .sort(doc! { "created_at": -1 })
        .await;

    match cursor {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(trips) => HttpResponse::Ok().json(trips),
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to fetch trips")
            }
        },
        Err(err) => {
            log::error!("Failed to query trips: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch trips")
        }
    }
}

pub async fn create(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<NewTrip>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    match mongo::destinations(&client)
        .find_one(doc! { "_id": input.destination_id })
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to check destination: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create trip");
        }
    }

    let now = Utc::now();
    let trip = Trip {
        id: None,
        user_id: user.id,
        destination_id: input.destination_id,
        itinerary: input.itinerary,
        start_date: input.start_date,
        end_date: input.end_date,
        budget: input.budget,
        currency: input.currency,
        status: input.status.unwrap_or(TripStatus::Upcoming),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let trip_id = match mongo::trips(&client).insert_one(&trip).await {
        Ok(result) => match result.inserted_id.as_object_id() {
            Some(id) => id,
            None => return HttpResponse::InternalServerError().body("Failed to create trip"),
        },
        Err(err) => {
            log::error!("Failed to insert trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create trip");
        }
    };

    // The owner's trip history carries the new id; the list drives the
    // profile view and is pruned again on delete.
    if let Err(err) = mongo::users(&client)
        .update_one(
            doc! { "_id": user.id },
            doc! { "$push": { "trip_history": trip_id } },
        )
        .await
    {
        log::error!("Failed to append trip to history: {:?}", err);
        return HttpResponse::InternalServerError().body("Failed to create trip");
    }

    let mut stored = trip;
    stored.id = Some(trip_id);
    HttpResponse::Created().json(stored)
}

pub async fn get_by_id(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    let client = data.into_inner();
    match mongo::trips(&client).find_one(doc! { "_id": id }).await {
        Ok(Some(trip)) => {
            if !owns(&trip.user_id, &user) {
                return HttpResponse::Forbidden().body("Not allowed to view this trip");
            }
            HttpResponse::Ok().json(trip)
        }
        Ok(None) => HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            log::error!("Failed to fetch trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch trip")
        }
    }
}

pub async fn update(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<UpdateTrip>,
) -> impl Responder {
    let id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    let client = data.into_inner();
    let collection = mongo::trips(&client);

    let existing = match collection.find_one(doc! { "_id": id }).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            log::error!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to update trip");
        }
    };
    if !owns(&existing.user_id, &user) {
        return HttpResponse::Forbidden().body("Not allowed to modify this trip");
    }

    let input = input.into_inner();
    let updated = Trip {
        id: existing.id,
        user_id: existing.user_id,
        destination_id: existing.destination_id,
        itinerary: input.itinerary,
        start_date: input.start_date,
        end_date: input.end_date,
        budget: input.budget,
        currency: input.currency,
        status: input.status.unwrap_or(existing.status),
        created_at: existing.created_at,
        updated_at: Some(Utc::now()),
    };

    match collection.replace_one(doc! { "_id": id }, &updated).await {
        Ok(_) => HttpResponse::Ok().json(updated),
        Err(err) => {
            log::error!("Failed to update trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update trip")
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
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    let client = data.into_inner();
    let collection = mongo::trips(&client);

    let existing = match collection.find_one(doc! { "_id": id }).await {
        Ok(Some(trip)) => trip,
        // A repeated delete lands here: 404, never a crash.
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            log::error!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to delete trip");
        }
    };
    if !owns(&existing.user_id, &user) {
        return HttpResponse::Forbidden().body("Not allowed to delete this trip");
    }

    match collection.delete_one(doc! { "_id": id }).await {
        Ok(result) if result.deleted_count == 0 => {
            HttpResponse::NotFound().body("Trip not found")
        }
        Ok(_) => {
            if let Err(err) = mongo::users(&client)
                .update_one(
                    doc! { "_id": user.id },
                    doc! { "$pull": { "trip_history": id } },
                )
                .await
            {
                log::error!("Failed to prune trip history: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to delete trip");
            }
            HttpResponse::Ok().body("Trip deleted")
        }
        Err(err) => {
            log::error!("Failed to delete trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to delete trip")
        }
    }
}
