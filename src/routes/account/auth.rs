use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::error::WriteError;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::models::user::{
    AuthResponse, LoginRequest, SignupRequest, User, UserResponse, UserRole,
};
use crate::services::account_service::{
    email_taken, hash_password, is_valid_email, username_taken, verify_password,
    MIN_PASSWORD_LENGTH,
};
use crate::services::token_service::issue_token;

pub async fn signup(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<SignupRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();

    if input.username.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "field": "username", "message": "Username must not be empty" }));
    }
    if !is_valid_email(&input.email) {
        return HttpResponse::BadRequest()
            .json(json!({ "field": "email", "message": "Invalid email address" }));
    }
    if input.password.len() < MIN_PASSWORD_LENGTH {
        return HttpResponse::BadRequest().json(json!({
            "field": "password",
            "message": format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH)
        }));
    }

    // Pre-checks give field-level errors; the unique indexes still backstop
    // any race, surfaced below as duplicate-key 11000.
    match username_taken(&client, &input.username).await {
        Ok(true) => {
            return HttpResponse::BadRequest()
                .json(json!({ "field": "username", "message": "Username already taken" }))
        }
        Ok(false) => {}
        Err(err) => {
            log::error!("Failed to check username: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create user");
        }
    }
    match email_taken(&client, &input.email).await {
        Ok(true) => {
            return HttpResponse::BadRequest()
                .json(json!({ "field": "email", "message": "Email already registered" }))
        }
        Ok(false) => {}
        Err(err) => {
            log::error!("Failed to check email: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create user");
        }
    }

    let hashed = match hash_password(&input.password) {
        Ok(hashed) => hashed,
        Err(err) => {
            log::error!("Password hashing failed: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to create user");
        }
    };

    let now = Utc::now();
    let user = User {
        id: None,
        username: input.username,
        email: input.email,
        password: Some(hashed),
        google_id: None,
        role: UserRole::User,
        is_active: true,
        bio: input.bio,
        profile_picture: input.profile_picture,
        saved_destinations: vec![],
        trip_history: vec![],
        created_at: Some(now),
        updated_at: Some(now),
        last_login: Some(now),
    };

    match mongo::users(&client).insert_one(&user).await {
        Ok(result) => {
            let user_id = match result.inserted_id.as_object_id() {
                Some(id) => id,
                None => {
                    return HttpResponse::InternalServerError().body("Failed to create user")
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
        Err(err) => match *err.kind {
            mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                WriteError { code: 11000, .. },
            )) => HttpResponse::BadRequest()
                .json(json!({ "message": "Username or email already in use" })),
            _ => {
                log::error!("Failed to insert user: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to create user")
            }
        },
    }
}

pub async fn login(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<LoginRequest>,
) -> impl Responder {
    let client = data.into_inner();
    let input = input.into_inner();
    let collection = mongo::users(&client);

    let user = match collection.find_one(doc! { "email": &input.email }).await {
        Ok(Some(user)) => user,
        // Same response as a bad password so the endpoint does not reveal
        // which emails have accounts.
        Ok(None) => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid credentials" }))
        }
        Err(err) => {
            log::error!("Database error during login: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to process login");
        }
    };

    let stored_hash = match &user.password {
        Some(hash) => hash,
        None => {
            return HttpResponse::BadRequest().json(json!({ "message": "Invalid credentials" }))
        }
    };
    if !verify_password(&input.password, stored_hash) {
        return HttpResponse::BadRequest().json(json!({ "message": "Invalid credentials" }));
    }
    if !user.is_active {
        return HttpResponse::BadRequest().json(json!({ "message": "Account deactivated" }));
    }

    let user_id = match user.id {
        Some(id) => id,
        None => return HttpResponse::InternalServerError().body("Failed to process login"),
    };

    let update = doc! { "$set": { "last_login": Utc::now().to_rfc3339() } };
    if let Err(err) = collection.update_one(doc! { "_id": user_id }, update).await {
        log::error!("Failed to refresh last_login: {:?}", err);
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
