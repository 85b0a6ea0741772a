use actix_web::{web, HttpResponse, Responder};
use bson::doc;
use bson::oid::ObjectId;
use mongodb::Client;
use std::sync::Arc;

use crate::db::mongo;
use crate::middleware::auth_context::CurrentUser;

pub async fn save_destination(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let destination_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let client = data.into_inner();

    match mongo::destinations(&client)
        .find_one(doc! { "_id": destination_id })
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().body("Destination not found"),
        Err(err) => {
            log::error!("Failed to check destination: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to save destination");
        }
    }

    // $addToSet keeps the saved list duplicate-free even on repeated calls.
    match mongo::users(&client)
        .update_one(
            doc! { "_id": user.id },
            doc! { "$addToSet": { "saved_destinations": destination_id } },
        )
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Destination saved"),
        Err(err) => {
            log::error!("Failed to save destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to save destination")
        }
    }
}

pub async fn unsave_destination(
    user: CurrentUser,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let destination_id = match ObjectId::parse_str(path.into_inner().as_str()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid destination ID"),
    };

    let client = data.into_inner();

    match mongo::users(&client)
        .update_one(
            doc! { "_id": user.id },
            doc! { "$pull": { "saved_destinations": destination_id } },
        )
        .await
    {
        Ok(_) => HttpResponse::Ok().body("Destination removed from saved"),
        Err(err) => {
            log::error!("Failed to remove saved destination: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to remove saved destination")
        }
    }
}
