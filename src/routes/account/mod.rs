pub mod auth;
pub mod google_auth;
pub mod profile;
pub mod saved_destinations;
