use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(client: web::Data<Arc<Client>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&client).await;
    if mongo_result.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("mongodb".to_string(), mongo_result);

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: &Client) -> ServiceStatus {
    match client
        .database(crate::db::mongo::DB_NAME)
        .run_command(doc! { "ping": 1 })
        .await
    {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: None,
        },
        Err(err) => ServiceStatus {
            status: "error".to_string(),
            details: Some(err.to_string()),
        },
    }
}
