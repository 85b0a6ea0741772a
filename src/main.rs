use actix_cors::Cors;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use wanderwise_api::config::AppConfig;
use wanderwise_api::db;
use wanderwise_api::middleware::{auth::AuthMiddleware, role_auth::RequireRole};
use wanderwise_api::models::user::UserRole;
use wanderwise_api::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let config = AppConfig::from_env();
    let host = config.host.clone();
    let port = config.port;
    println!("Attempting to bind to {}:{}", host, port);

    let client = db::mongo::create_mongo_client(&config.mongo_uri).await;

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        if config.allowed_origins.is_empty() {
            cors = cors.allow_any_origin();
        } else {
            for origin in &config.allowed_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(config.clone()))
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
                            // Public browsing; method guards let the same paths
                            // fall through to the protected resources below.
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
                            .route(
                                "/{id}/entries",
                                web::post().to(routes::journal::add_entry),
                            )
                            .service(
                                web::resource("/{id}/entries/{entry_id}")
                                    .route(web::put().to(routes::journal::update_entry))
                                    .route(web::delete().to(routes::journal::delete_entry)),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
