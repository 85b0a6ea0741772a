use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use bson::doc;
use bson::oid::ObjectId;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo;
use crate::middleware::auth_context::{owns, CurrentUser};
use crate::models::journal::{EntryInput, Journal, JournalEntry, NewJournal};

/// Loads the trip and confirms the caller owns it. Journals hang off trips,
/// so every journal operation starts with this check.
async fn authorize_trip(
    client: &Client,
    trip_id: ObjectId,
    user: &CurrentUser,
) -> Result<(), HttpResponse> {
    match mongo::trips(client).find_one(doc! { "_id": trip_id }).await {
        Ok(Some(trip)) => {
            if owns(&trip.user_id, user) {
                Ok(())
            } else {
                Err(HttpResponse::Forbidden().body("Not allowed to access this trip"))
            }
        }
        Ok(None) => Err(HttpResponse::NotFound().body("Trip not found")),
        Err(err) => {
            log::error!("Failed to fetch trip: {:?}", err);
            Err(HttpResponse::InternalServerError().body("Failed to access journal"))
        }
    }
}

/// Returns the journal for a trip, creating an empty one on first access.
pub async fn get_by_trip(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let trip_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID"),
    };

    let client = data.into_inner();
    if let Err(response) = authorize_trip(&client, trip_id, &user).await {
        return response;
    }

    let collection = mongo::journals(&client);
    let filter = doc! { "user_id": user.id, "trip_id": trip_id };

    match collection.find_one(filter).await {
        Ok(Some(journal)) => HttpResponse::Ok().json(journal),
        Ok(None) => {
            let now = Utc::now();
            let journal = Journal {
                id: None,
                user_id: user.id,
                trip_id,
                entries: vec![],
                created_at: Some(now),
                updated_at: Some(now),
            };
            match collection.insert_one(&journal).await {
                Ok(result) => {
                    let mut stored = journal;
                    stored.id = result.inserted_id.as_object_id();
                    HttpResponse::Ok().json(stored)
                }
                Err(err) => {
                    log::error!("Failed to create journal: {:?}", err);
                    HttpResponse::InternalServerError().body("Failed to access journal")
                }
            }
        }
        Err(err) => {
            log::error!("Failed to fetch journal: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to access journal")
        }
    }
}

pub async fn create(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    input: web::Json<NewJournal>,
) -> impl Responder {
    let trip_id = input.into_inner().trip_id;

    let client = data.into_inner();
    if let Err(response) = authorize_trip(&client, trip_id, &user).await {
        return response;
    }

    let collection = mongo::journals(&client);

    // One journal per (user, trip); a second create is a client error.
    match collection
        .find_one(doc! { "user_id": user.id, "trip_id": trip_id })
        .await
    {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest()
                .json(json!({ "message": "A journal already exists for this trip" }))
        }
        Ok(None) => {}
        Err(err) => {
            log::error!("Failed to check for existing journal: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create journal");
        }
    }

    let now = Utc::now();
    let journal = Journal {
        id: None,
        user_id: user.id,
        trip_id,
        entries: vec![],
        created_at: Some(now),
        updated_at: Some(now),
    };

    match collection.insert_one(&journal).await {
        Ok(result) => {
            let mut stored = journal;
            stored.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(stored)
        }
        Err(err) => {
            log::error!("Failed to create journal: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create journal")
        }
    }
}

async fn load_owned_journal(
    client: &Client,
    journal_id: ObjectId,
    user: &CurrentUser,
) -> Result<Journal, HttpResponse> {
    match mongo::journals(client)
        .find_one(doc! { "_id": journal_id })
        .await
    {
        Ok(Some(journal)) => {
            if owns(&journal.user_id, user) {
                Ok(journal)
            } else {
                Err(HttpResponse::Forbidden().body("Not allowed to access this journal"))
            }
        }
        Ok(None) => Err(HttpResponse::NotFound().body("Journal not found")),
        Err(err) => {
            log::error!("Failed to fetch journal: {:?}", err);
            Err(HttpResponse::InternalServerError().body("Failed to access journal"))
        }
    }
}

pub async fn add_entry(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<EntryInput>,
) -> impl Responder {
    let journal_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid journal ID"),
    };

    let input = input.into_inner();
    if let Some(message) = input.validate() {
        return HttpResponse::BadRequest().json(json!({ "message": message }));
    }

    let client = data.into_inner();
    if let Err(response) = load_owned_journal(&client, journal_id, &user).await {
        return response;
    }

    let entry = JournalEntry {
        id: ObjectId::new(),
        date: input.date,
        title: input.title,
        content: input.content,
        mood: input.mood,
        photos: input.photos,
        created_at: Some(Utc::now()),
    };

    let entry_bson = match bson::to_bson(&entry) {
        Ok(bson) => bson,
        Err(err) => {
            log::error!("Failed to serialize entry: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to add entry");
        }
    };

    let update = doc! {
        "$push": { "entries": entry_bson },
        "$set": { "updated_at": Utc::now().to_rfc3339() },
    };

    match mongo::journals(&client)
        .update_one(doc! { "_id": journal_id }, update)
        .await
    {
        Ok(_) => HttpResponse::Created().json(entry),
        Err(err) => {
            log::error!("Failed to add entry: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to add entry")
        }
    }
}

pub async fn update_entry(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    input: web::Json<EntryInput>,
) -> impl Responder {
    let (journal_id, entry_id) = path.into_inner();
    let journal_id = match ObjectId::parse_str(&journal_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid journal ID"),
    };
    let entry_id = match ObjectId::parse_str(&entry_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid entry ID"),
    };

    let input = input.into_inner();
    if let Some(message) = input.validate() {
        return HttpResponse::BadRequest().json(json!({ "message": message }));
    }

    let client = data.into_inner();
    let journal = match load_owned_journal(&client, journal_id, &user).await {
        Ok(journal) => journal,
        Err(response) => return response,
    };
    if !journal.entries.iter().any(|e| e.id == entry_id) {
        return HttpResponse::NotFound().body("Entry not found");
    }

    let update = doc! {
        "$set": {
            "entries.$.date": &input.date,
            "entries.$.title": &input.title,
            "entries.$.content": &input.content,
            "entries.$.mood": input.mood,
            "entries.$.photos": input.photos.clone(),
            "updated_at": Utc::now().to_rfc3339(),
        }
    };

    match mongo::journals(&client)
        .update_one(doc! { "_id": journal_id, "entries._id": entry_id }, update)
        .await
    {
        Ok(result) if result.matched_count == 0 => {
            HttpResponse::NotFound().body("Entry not found")
        }
        Ok(_) => HttpResponse::Ok().body("Entry updated"),
        Err(err) => {
            log::error!("Failed to update entry: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update entry")
        }
    }
}

pub async fn delete_entry(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (journal_id, entry_id) = path.into_inner();
    let journal_id = match ObjectId::parse_str(&journal_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid journal ID"),
    };
    let entry_id = match ObjectId::parse_str(&entry_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid entry ID"),
    };

    let client = data.into_inner();
    let journal = match load_owned_journal(&client, journal_id, &user).await {
        Ok(journal) => journal,
        Err(response) => return response,
    };
    if !journal.entries.iter().any(|e| e.id == entry_id) {
        return HttpResponse::NotFound().body("Entry not found");
    }

    let update = doc! {
        "$pull": { "entries": { "_id": entry_id } },
        "$set": { "updated_at": Utc::now().to_rfc3339() },
    };

    match mongo::journals(&client)
        .update_one(doc! { "_id": journal_id }, update)
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Entry deleted"),
        Err(err) => {
            log::error!("Failed to delete entry: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to delete entry")
        }
    }
}
