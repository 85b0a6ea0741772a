use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::sync::Arc;
use std::time::Duration;

pub const DB_NAME: &str = "wanderwise";

pub async fn create_mongo_client(uri: &str) -> Arc<Client> {
    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    // Verify the connection actually works before the server starts taking traffic.
    match client
        .database(DB_NAME)
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

pub fn users(client: &Client) -> Collection<crate::models::user::User> {
    client.database(DB_NAME).collection("users")
}

pub fn destinations(client: &Client) -> Collection<crate::models::destination::Destination> {
    client.database(DB_NAME).collection("destinations")
}

pub fn trips(client: &Client) -> Collection<crate::models::trip::Trip> {
    client.database(DB_NAME).collection("trips")
}

pub fn journals(client: &Client) -> Collection<crate::models::journal::Journal> {
    client.database(DB_NAME).collection("journals")
}
