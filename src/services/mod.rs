pub mod account_service;
pub mod google_auth_service;
pub mod token_service;
