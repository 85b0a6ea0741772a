use mongodb::bson::doc;
use mongodb::Client;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Salted bcrypt hash. Called explicitly at the signup and change-password
/// sites, never implicitly on unrelated document updates.
pub fn hash_password(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
}

/// False on mismatch or on any bcrypt failure. Never panics, never logs the
/// plaintext or the hash.
pub fn verify_password(plaintext: &str, hashed: &str) -> bool {
    bcrypt::verify(plaintext, hashed).unwrap_or(false)
}

pub fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

pub async fn username_taken(client: &Client, username: &str) -> Result<bool, mongodb::error::Error> {
    let existing = crate::db::mongo::users(client)
        .find_one(doc! { "username": username })
        .await?;
    Ok(existing.is_some())
}

pub async fn email_taken(client: &Client, email: &str) -> Result<bool, mongodb::error::Error> {
    let existing = crate::db::mongo::users(client)
        .find_one(doc! { "email": email })
        .await?;
    Ok(existing.is_some())
}
