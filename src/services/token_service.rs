use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Identity only. Role and account status are re-read from the store on every
/// request, so deactivation and role changes take effect without waiting for
/// the token to expire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

pub fn issue_token(
    user_id: &ObjectId,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    issue_token_with_expiry(user_id, secret, Duration::days(TOKEN_LIFETIME_DAYS))
}

pub fn issue_token_with_expiry(
    user_id: &ObjectId,
    secret: &str,
    lifetime: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_hex(),
        iat: now.timestamp() as usize,
        exp: (now + lifetime).timestamp() as usize,
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_ref()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}
