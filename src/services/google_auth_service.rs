use reqwest::Client as ReqwestClient;
use serde::Deserialize;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Subset of the tokeninfo response we care about.
#[derive(Debug, Deserialize)]
pub struct GoogleTokenInfo {
    pub sub: String,
    pub email: String,
    // tokeninfo returns booleans as strings.
    pub email_verified: Option<String>,
    pub aud: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google reports whether it has verified the address itself. An unverified
/// email must never link to or create an account, since anyone can put an
/// arbitrary address on a Google account.
pub fn email_is_verified(info: &GoogleTokenInfo) -> bool {
    matches!(info.email_verified.as_deref(), Some("true"))
}

/// Verify a Google Sign-In ID token (the `credential` the client posts) and
/// return the identity it asserts. The audience must match our own OAuth
/// client id or the token was minted for some other application.
pub async fn verify_google_credential(
    credential: &str,
    expected_client_id: &str,
) -> Result<GoogleTokenInfo, String> {
    let client = ReqwestClient::new();
    let response = client
        .get(TOKENINFO_URL)
        .query(&[("id_token", credential)])
        .send()
        .await
        .map_err(|e| format!("Failed to reach Google tokeninfo: {}", e))?;

    if !response.status().is_success() {
        return Err(format!(
            "Google rejected the credential: {}",
            response.status()
        ));
    }

    let info = response
        .json::<GoogleTokenInfo>()
        .await
        .map_err(|e| format!("Failed to parse tokeninfo response: {}", e))?;

    if info.aud != expected_client_id {
        return Err("Credential was issued for a different client".to_string());
    }

    if !email_is_verified(&info) {
        return Err("Credential email is not verified".to_string());
    }

    Ok(info)
}

/// Local part of the email plus a slice of the Google subject, so first-time
/// federated users get a username that is unlikely to collide.
pub fn derive_username(email: &str, google_sub: &str) -> String {
    let local = email.split('@').next().unwrap_or("traveler");
    let suffix: String = google_sub.chars().rev().take(6).collect();
    format!("{}_{}", local, suffix)
}
