use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use bson::doc;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::models::user::{AuthResponse, GoogleLoginRequest, User, UserResponse, UserRole};
use crate::services::google_auth_service::{derive_username, verify_google_credential};
use crate::services::token_service::issue_token;

/// Federated login. The client posts the Google Sign-In ID token; we verify
/// it, then find the account by Google subject, link by email, or create a
/// fresh user on first sight.
pub async fn google_login(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<GoogleLoginRequest>,
) -> impl Responder {
    let client_id = match &config.google_client_id {
        Some(id) => id.clone(),
        None => {
            return HttpResponse::InternalServerError().body("Google login is not configured")
        }
    };

    let info = match verify_google_credential(&input.credential, &client_id).await {
        Ok(info) => info,
        Err(err) => {
            log::warn!("Google credential rejected: {}", err);
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid credential" }));
        }
    };

    let client = data.into_inner();
    let collection = mongo::users(&client);
    let now = Utc::now();

    let filter = doc! { "$or": [ { "google_id": &info.sub }, { "email": &info.email } ] };
    match collection.find_one(filter).await {
        Ok(Some(user)) => {
            if !user.is_active {
                return HttpResponse::BadRequest()
                    .json(json!({ "message": "Account deactivated" }));
            }
            let user_id = match user.id {
                Some(id) => id,
                None => {
                    return HttpResponse::InternalServerError().body("Failed to process login")
                }
            };

            // Link the Google subject to accounts first seen via password signup.
            let update = doc! { "$set": {
                "google_id": &info.sub,
                "last_login": now.to_rfc3339(),
            }};
            if let Err(err) = collection.update_one(doc! { "_id": user_id }, update).await {
                log::error!("Failed to update Google-linked user: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to process login");
            }

            match issue_token(&user_id, &config.jwt_secret) {
                Ok(token) => HttpResponse::Ok().json(AuthResponse {
                    user: UserResponse::from(user),
                    token,
                }),
                Err(err) => {
                    log::error!("Token generation failed: {:?}", err);
                    HttpResponse::InternalServerError().body("Token generation failed")
                }
            }
        }
        Ok(None) => {
            let user = User {
                id: None,
                username: derive_username(&info.email, &info.sub),
                email: info.email.clone(),
                password: None,
                google_id: Some(info.sub.clone()),
                role: UserRole::User,
                is_active: true,
                bio: None,
                profile_picture: info.picture.clone(),
                saved_destinations: vec![],
                trip_history: vec![],
                created_at: Some(now),
                updated_at: Some(now),
                last_login: Some(now),
            };

            match collection.insert_one(&user).await {
                Ok(result) => {
                    let user_id = match result.inserted_id.as_object_id() {
                        Some(id) => id,
                        None => {
                            return HttpResponse::InternalServerError()
                                .body("Failed to create user")
                        }
                    };
                    match issue_token(&user_id, &config.jwt_secret) {
                        Ok(token) => {
                            let mut stored = user;
                            stored.id = Some(user_id);
                            HttpResponse::Created().json(AuthResponse {
                                user: UserResponse::from(stored),
                                token,
                            })
                        }
                        Err(err) => {
                            log::error!("Token generation failed: {:?}", err);
                            HttpResponse::InternalServerError().body("Token generation failed")
                        }
                    }
                }
                Err(err) => {
                    log::error!("Failed to create Google user: {:?}", err);
                    HttpResponse::InternalServerError().body("Failed to create user")
                }
            }
        }
        Err(err) => {
            log::error!("Database error during Google login: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to process login")
        }
    }
}
