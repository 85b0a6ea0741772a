use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Process-wide configuration, read from the environment exactly once at
/// startup and shared through `web::Data`. Rotating `JWT_SECRET` invalidates
/// every outstanding token; clients are expected to log back in.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo_uri: String,
    pub jwt_secret: String,
    pub google_client_id: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Missing required configuration is a fatal startup error.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .unwrap_or(DEFAULT_PORT);

        let mongo_uri = env::var("MONGODB_URI").expect("MONGODB_URI must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let google_client_id = env::var("GOOGLE_CLIENT_ID").ok();

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        AppConfig {
            host,
            port,
            mongo_uri,
            jwt_secret,
            google_client_id,
            allowed_origins,
        }
    }
}
