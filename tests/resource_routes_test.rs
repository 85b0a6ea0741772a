mod common;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use bson::doc;
use bson::oid::ObjectId;
use serde_json::json;
use serial_test::serial;

use common::{
    call_status, cleanup_test_data, mongo_available, seed_destination, seed_user, TestApp,
    TEST_JWT_SECRET,
};
use wanderwise_api::db::mongo;
use wanderwise_api::services::token_service::issue_token;

// Handler-level tests against a real deployment. Without MONGODB_URI they
// skip; with it they exercise ownership and persistence end to end.

async fn create_trip<S, B>(app: &S, token: &str, destination: &ObjectId) -> ObjectId
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "destination_id": { "$oid": destination.to_hex() },
            "start_date": "2026-09-01",
            "end_date": "2026-09-07"
        }))
        .to_request();
    let (status, body) = call_status(app, req).await;
    assert_eq!(status, 201, "trip create failed: {:?}", body);
    let trip: serde_json::Value = serde_json::from_slice(&body).expect("trip body is JSON");
    ObjectId::parse_str(trip["_id"]["$oid"].as_str().expect("created trip carries an id"))
        .expect("trip id parses")
}

#[actix_rt::test]
#[serial]
async fn trip_is_hidden_from_other_users() {
    if !mongo_available() {
        println!("MONGODB_URI not set; skipping database-backed test");
        return;
    }
    let test_app = TestApp::new().await;
    cleanup_test_data(&test_app.client).await;
    let app = test::init_service(test_app.create_app()).await;

    let alice = seed_user(&test_app.client, "alice").await;
    let bob = seed_user(&test_app.client, "bob").await;
    let destination = seed_destination(&test_app.client, "kyoto").await;
    let alice_token = issue_token(&alice, TEST_JWT_SECRET).expect("token");
    let bob_token = issue_token(&bob, TEST_JWT_SECRET).expect("token");

    let trip_id = create_trip(&app, &alice_token, &destination).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id.to_hex()))
        .insert_header(("Authorization", format!("Bearer {}", bob_token)))
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 403);
    println!("✓ another user's fetch is forbidden");

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id.to_hex()))
        .insert_header(("Authorization", format!("Bearer {}", alice_token)))
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 200);
    println!("✓ the owner still sees the trip");

    cleanup_test_data(&test_app.client).await;
}

#[actix_rt::test]
#[serial]
async fn second_journal_for_a_trip_is_rejected() {
    if !mongo_available() {
        println!("MONGODB_URI not set; skipping database-backed test");
        return;
    }
    let test_app = TestApp::new().await;
    cleanup_test_data(&test_app.client).await;
    let app = test::init_service(test_app.create_app()).await;

    let carol = seed_user(&test_app.client, "carol").await;
    let destination = seed_destination(&test_app.client, "lisbon").await;
    let token = issue_token(&carol, TEST_JWT_SECRET).expect("token");

    let trip_id = create_trip(&app, &token, &destination).await;
    let payload = json!({ "trip_id": { "$oid": trip_id.to_hex() } });

    let req = test::TestRequest::post()
        .uri("/api/journals")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(&payload)
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 201);

    let req = test::TestRequest::post()
        .uri("/api/journals")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(&payload)
        .to_request();
    let (status, body) = call_status(&app, req).await;
    assert_eq!(status, 400);
    assert!(String::from_utf8_lossy(&body).contains("already exists"));

    let count = mongo::journals(&test_app.client)
        .count_documents(doc! { "user_id": carol, "trip_id": trip_id })
        .await
        .expect("count journals");
    assert_eq!(count, 1, "the rejected create must not persist a document");
    println!("✓ one journal per trip, no stray second document");

    cleanup_test_data(&test_app.client).await;
}

#[actix_rt::test]
#[serial]
async fn deleting_a_trip_twice_returns_not_found() {
    if !mongo_available() {
        println!("MONGODB_URI not set; skipping database-backed test");
        return;
    }
    let test_app = TestApp::new().await;
    cleanup_test_data(&test_app.client).await;
    let app = test::init_service(test_app.create_app()).await;

    let dave = seed_user(&test_app.client, "dave").await;
    let destination = seed_destination(&test_app.client, "oslo").await;
    let token = issue_token(&dave, TEST_JWT_SECRET).expect("token");

    let trip_id = create_trip(&app, &token, &destination).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}", trip_id.to_hex()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}", trip_id.to_hex()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 404);
    println!("✓ repeated delete is a clean 404");

    cleanup_test_data(&test_app.client).await;
}

#[actix_rt::test]
#[serial]
async fn trip_history_tracks_create_and_delete() {
    if !mongo_available() {
        println!("MONGODB_URI not set; skipping database-backed test");
        return;
    }
    let test_app = TestApp::new().await;
    cleanup_test_data(&test_app.client).await;
    let app = test::init_service(test_app.create_app()).await;

    let erin = seed_user(&test_app.client, "erin").await;
    let destination = seed_destination(&test_app.client, "quito").await;
    let token = issue_token(&erin, TEST_JWT_SECRET).expect("token");

    let trip_id = create_trip(&app, &token, &destination).await;

    let record = mongo::users(&test_app.client)
        .find_one(doc! { "_id": erin })
        .await
        .expect("load user")
        .expect("seeded user exists");
    assert!(record.trip_history.contains(&trip_id));
    println!("✓ create appended the trip to the owner's history");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}", trip_id.to_hex()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let (status, _) = call_status(&app, req).await;
    assert_eq!(status, 200);

    let record = mongo::users(&test_app.client)
        .find_one(doc! { "_id": erin })
        .await
        .expect("load user")
        .expect("seeded user exists");
    assert!(!record.trip_history.contains(&trip_id));
    println!("✓ delete pruned the trip from the owner's history");

    cleanup_test_data(&test_app.client).await;
}
