use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{guard, web, App};
use bson::doc;
use bson::oid::ObjectId;
use chrono::Utc;
use futures::TryStreamExt;
use std::sync::Arc;

use wanderwise_api::config::AppConfig;
use wanderwise_api::db::mongo;
use wanderwise_api::middleware::{auth::AuthMiddleware, role_auth::RequireRole};
use wanderwise_api::models::destination::Destination;
use wanderwise_api::models::user::{User, UserRole};
use wanderwise_api::routes;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Prefix on every document the tests insert, so cleanup can find them.
#[allow(dead_code)]
pub const TEST_MARKER: &str = "ww_test_";

/// Database-backed tests only run against an explicitly configured
/// deployment; without MONGODB_URI they skip instead of timing out.
#[allow(dead_code)]
pub fn mongo_available() -> bool {
    std::env::var("MONGODB_URI").is_ok()
}

#[allow(dead_code)]
pub async fn cleanup_test_data(client: &mongodb::Client) {
    let marker = format!("^{}", TEST_MARKER);
    let seeded: Vec<User> = match mongo::users(client)
        .find(doc! { "username": { "$regex": &marker } })
        .await
    {
        Ok(cursor) => cursor.try_collect().await.unwrap_or_default(),
        Err(_) => vec![],
    };
    let ids: Vec<ObjectId> = seeded.into_iter().filter_map(|u| u.id).collect();
    if !ids.is_empty() {
        let _ = mongo::trips(client)
            .delete_many(doc! { "user_id": { "$in": ids.clone() } })
            .await;
        let _ = mongo::journals(client)
            .delete_many(doc! { "user_id": { "$in": ids.clone() } })
            .await;
        let _ = mongo::users(client)
            .delete_many(doc! { "_id": { "$in": ids } })
            .await;
    }
    let _ = mongo::destinations(client)
        .delete_many(doc! { "name": { "$regex": &marker } })
        .await;
}

#[allow(dead_code)]
pub async fn seed_user(client: &mongodb::Client, tag: &str) -> ObjectId {
    let now = Utc::now();
    let user = User {
        id: None,
        username: format!("{}{}", TEST_MARKER, tag),
        email: format!("{}{}@example.com", TEST_MARKER, tag),
        password: None,
        google_id: Some(format!("test-sub-{}", tag)),
        role: UserRole::User,
        is_active: true,
        bio: None,
        profile_picture: None,
        saved_destinations: vec![],
        trip_history: vec![],
        created_at: Some(now),
        updated_at: Some(now),
        last_login: None,
    };
    mongo::users(client)
        .insert_one(&user)
        .await
        .expect("Failed to seed user")
        .inserted_id
        .as_object_id()
        .expect("Seeded user has no ObjectId")
}

#[allow(dead_code)]
pub async fn seed_destination(client: &mongodb::Client, tag: &str) -> ObjectId {
    let now = Utc::now();
    let destination = Destination {
        id: None,
        name: format!("{}{}", TEST_MARKER, tag),
        description: "Seeded for handler tests".to_string(),
        country: "Japan".to_string(),
        location: None,
        images: vec![],
        activities: vec![],
        best_season: None,
        popular_attractions: vec![],
        is_popular: false,
        is_approved: true,
        added_by: None,
        approved_by: None,
        rating: 0.0,
        reviews: vec![],
        created_at: Some(now),
        updated_at: Some(now),
    };
    mongo::destinations(client)
        .insert_one(&destination)
        .await
        .expect("Failed to seed destination")
        .inserted_id
        .as_object_id()
        .expect("Seeded destination has no ObjectId")
}

/// Drives a request through the app and returns (status, body). Middleware
/// rejections surface as service errors, so both arms are needed.
pub async fn call_status<S, B>(
    app: &S,
    req: actix_http::Request,
) -> (StatusCode, actix_web::web::Bytes)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match app.call(req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = actix_web::test::read_body(resp).await;
            (status, body)
        }
        Err(err) => {
            let resp = actix_web::HttpResponse::from_error(err);
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, body)
        }
    }
}

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        // Lazy client: the driver connects on first operation. Tests that
        // need the database skip themselves unless MONGODB_URI is set.
        let mongo_uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| {
            // Short timeouts so handler-level failures surface quickly when
            // no local MongoDB is running.
            "mongodb://localhost:27017/?serverSelectionTimeoutMS=2000&connectTimeoutMS=2000"
                .to_string()
        });
        let client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to build MongoDB client");

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mongo_uri,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            google_client_id: None,
            allowed_origins: vec![],
        };

        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(routes::account::auth::signup))
                            .route("/login", web::post().to(routes::account::auth::login))
                            .route(
                                "/google",
                                web::post().to(routes::account::google_auth::google_login),
                            )
                            .service(
                                web::scope("")
                                    .wrap(AuthMiddleware)
                                    .service(
                                        web::resource("/profile")
                                            .route(
                                                web::get()
                                                    .to(routes::account::profile::get_profile),
                                            )
                                            .route(
                                                web::put()
                                                    .to(routes::account::profile::update_profile),
                                            ),
                                    )
                                    .route(
                                        "/change-password",
                                        web::put().to(routes::account::profile::change_password),
                                    )
                                    .service(
                                        web::resource("/save-destination/{id}")
                                            .route(web::post().to(
                                                routes::account::saved_destinations::save_destination,
                                            ))
                                            .route(web::delete().to(
                                                routes::account::saved_destinations::unsave_destination,
                                            )),
                                    ),
                            ),
                    )
                    .service(
                        web::scope("/destinations")
                            .service(
                                web::resource("")
                                    .guard(guard::Get())
                                    .route(web::get().to(routes::destination::get_all)),
                            )
                            .service(
                                web::resource("")
                                    .guard(guard::Post())
                                    .wrap(RequireRole::new(UserRole::Admin))
                                    .wrap(AuthMiddleware)
                                    .route(web::post().to(routes::destination::create)),
                            )
                            .service(
                                web::resource("/{id}/reviews")
                                    .wrap(AuthMiddleware)
                                    .route(web::post().to(routes::destination::add_review)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .guard(guard::Get())
                                    .route(web::get().to(routes::destination::get_by_id)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .wrap(AuthMiddleware)
                                    .route(web::put().to(routes::destination::update))
                                    .route(web::delete().to(routes::destination::delete)),
                            ),
                    )
                    .service(
                        web::scope("/trips")
                            .wrap(AuthMiddleware)
                            .service(
                                web::resource("")
                                    .route(web::get().to(routes::trip::get_all))
                                    .route(web::post().to(routes::trip::create)),
                            )
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(routes::trip::get_by_id))
                                    .route(web::put().to(routes::trip::update))
                                    .route(web::delete().to(routes::trip::delete)),
                            ),
                    )
                    .service(
                        web::scope("/journals")
                            .wrap(AuthMiddleware)
                            .route(
                                "/trip/{trip_id}",
                                web::get().to(routes::journal::get_by_trip),
                            )
                            .service(
                                web::resource("").route(web::post().to(routes::journal::create)),
                            )
                            .route("/{id}/entries", web::post().to(routes::journal::add_entry))
                            .service(
                                web::resource("/{id}/entries/{entry_id}")
                                    .route(web::put().to(routes::journal::update_entry))
                                    .route(web::delete().to(routes::journal::delete_entry)),
                            ),
                    ),
            )
    }
}
