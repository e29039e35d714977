use std::env;

/// Request timeout for API calls. The insights endpoints sit in front of a
/// generative backend and can take most of a minute to answer.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_GOOGLE_CLIENT_ID: &str =
    "903842057627-bkrl6ud9f9ogcejgaaiuoa4rih2eoiba.apps.googleusercontent.com";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/jobnest/auth";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the JobNest API
    pub api_url: String,
    /// OAuth client id for the Google sign-in flow
    pub google_client_id: String,
    /// Redirect URI registered with the OAuth provider
    pub redirect_uri: String,
    /// Log filter (trace, debug, info, warn, error)
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_url = env::var("JOBNEST_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let google_client_id = env::var("JOBNEST_GOOGLE_CLIENT_ID")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_CLIENT_ID.to_string());

        let redirect_uri = env::var("JOBNEST_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());

        let log_filter = env::var("JOBNEST_LOG").unwrap_or_else(|_| "warn".to_string());

        Self {
            api_url,
            google_client_id,
            redirect_uri,
            log_filter,
        }
    }
}
