use anyhow::{Context, Result, anyhow, bail};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::api::{ApiClient, ApiError, percent_encode};
use crate::config::Config;
use crate::models::{AuthResponse, PreviousUser, User};
use crate::store::{Store, keys};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PASSWORD_SPECIALS: &str = "@$!%*?&.,";

pub const PASSWORD_RULES: &str =
    "Password must be at least 8 characters with uppercase, lowercase, number and special character";

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Where a freshly signed-in user lands, decided by the server-supplied
/// profile-complete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Insights,
    Onboarding,
}

/// Protected commands call this first; without a stored token they fail with
/// the sign-in redirect message.
pub fn require_auth(store: &Store) -> Result<String> {
    store
        .token()
        .ok_or_else(|| anyhow!("You are not signed in. Run `jobnest login` first."))
}

pub fn validate_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// Client-side password policy, checked before any network call: at least 8
/// characters, with lowercase, uppercase, a digit and one of `@$!%*?&.,`,
/// drawn only from that class.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);

    let ok = password.len() >= 8
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if ok { Ok(()) } else { Err(PASSWORD_RULES) }
}

/// Persist a successful authentication and pick the next step.
pub fn handle_auth_success(store: &Store, response: &AuthResponse) -> Result<NextStep> {
    store.set_token(&response.token)?;
    store.set(keys::USER_DATA, &response.user)?;
    store.set(
        keys::PREVIOUS_USER_DATA,
        &PreviousUser {
            email: response.user.email.clone(),
            last_login: chrono::Utc::now().to_rfc3339(),
        },
    )?;

    if response.user.is_profile_complete {
        Ok(NextStep::Insights)
    } else {
        Ok(NextStep::Onboarding)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

pub fn login(api: &ApiClient, store: &Store, email: &str, password: &str) -> Result<NextStep> {
    let response: AuthResponse = api
        .post("/auth/login", &LoginRequest { email, password })
        .context("Failed to authenticate")?;
    info!(email, "signed in");
    handle_auth_success(store, &response)
}

pub fn register(
    api: &ApiClient,
    store: &Store,
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<NextStep> {
    if password != confirm_password {
        bail!("Passwords do not match");
    }

    let response: AuthResponse = api
        .post(
            "/auth/register",
            &RegisterRequest {
                name,
                email,
                password,
            },
        )
        .context("Failed to create account")?;
    info!(email, "registered");
    handle_auth_success(store, &response)
}

pub fn logout(store: &Store) -> Result<()> {
    store.clear_credentials()
}

/// Request a password reset link. Unknown accounts still report success so
/// the command never confirms whether an email is registered.
pub fn forgot_password(api: &ApiClient, email: &str) -> Result<()> {
    if !validate_email(email) {
        bail!("Please enter a valid email address.");
    }

    let result: Result<serde_json::Value, ApiError> =
        api.post("/auth/forgot-password", &serde_json::json!({ "email": email }));

    match result {
        Ok(_) => Ok(()),
        Err(
            e @ (ApiError::RateLimited
            | ApiError::Server(_)
            | ApiError::Validation(_)
            | ApiError::Network(_)),
        ) => Err(e.into()),
        Err(_) => Ok(()),
    }
}

pub fn validate_reset_token(api: &ApiClient, token: &str) -> Result<()> {
    let path = format!("/auth/validate-reset-token/{}", percent_encode(token));
    match api.get::<serde_json::Value>(&path) {
        Ok(_) => Ok(()),
        Err(ApiError::Status(404)) => {
            bail!("Token validation endpoint not found. Please contact support.")
        }
        Err(ApiError::Validation(_) | ApiError::Status(400)) => {
            bail!("Invalid or expired token. Please request a new password reset link.")
        }
        Err(_) => bail!("Unable to validate reset token. Please try again or request a new link."),
    }
}

pub fn reset_password(
    api: &ApiClient,
    store: &Store,
    token: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    if password != confirm_password {
        bail!("Passwords do not match");
    }
    if let Err(message) = validate_password(password) {
        bail!("{message}");
    }

    let response: serde_json::Value = api
        .post(
            "/auth/reset-password",
            &serde_json::json!({ "token": token, "password": password }),
        )
        .map_err(|e| match e {
            ApiError::Status(400) => {
                anyhow!("Invalid or expired token. Please request a new password reset link.")
            }
            other => other.into(),
        })?;

    // Carry the profile-complete flag into the stored user when the server
    // reports it.
    if let Some(is_complete) = response
        .get("isProfileComplete")
        .and_then(serde_json::Value::as_bool)
    {
        if let Some(mut user) = store.get::<User>(keys::USER_DATA)? {
            user.is_profile_complete = is_complete;
            store.set(keys::USER_DATA, &user)?;
        }
    }

    Ok(())
}

// --- Google OAuth (authorization code + PKCE) ---

pub fn generate_code_verifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// S256 code challenge: base64url(SHA-256(verifier)), unpadded.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Start the Google sign-in flow: store a fresh verifier under `codeVerifier`
/// and return the authorization URL for the user to open.
pub fn begin_google_auth(store: &Store, config: &Config) -> Result<String> {
    let verifier = generate_code_verifier();
    store.set(keys::CODE_VERIFIER, &verifier)?;

    Ok(format!(
        "{GOOGLE_AUTH_ENDPOINT}?client_id={}&redirect_uri={}&response_type=code&scope=email%20profile&code_challenge={}&code_challenge_method=S256",
        percent_encode(&config.google_client_id),
        percent_encode(&config.redirect_uri),
        code_challenge(&verifier),
    ))
}

#[derive(Serialize)]
struct GoogleAuthRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
    redirect_uri: &'a str,
}

/// Finish the Google sign-in flow with the code from the redirect. Without a
/// stored verifier the attempt is unrecoverable and the flow restarts.
pub fn complete_google_auth(
    api: &ApiClient,
    store: &Store,
    config: &Config,
    code: &str,
) -> Result<NextStep> {
    let Some(verifier) = store.get::<String>(keys::CODE_VERIFIER)? else {
        bail!("Authentication failed: missing verification code. Please run `jobnest google` again.");
    };

    let response: AuthResponse = api
        .post(
            "/auth/google",
            &GoogleAuthRequest {
                code,
                code_verifier: &verifier,
                redirect_uri: &config.redirect_uri,
            },
        )
        .context("Google authentication failed. Please try again.")?;

    let next = handle_auth_success(store, &response)?;
    store.remove(keys::CODE_VERIFIER)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_password_policy_accepts_conforming() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("Abcdef1,").is_ok());
        assert!(validate_password("XyZ98765&extra").is_ok());
    }

    #[test]
    fn test_password_policy_rejects_nonconforming() {
        // too short
        assert!(validate_password("Ab1!").is_err());
        // missing uppercase
        assert!(validate_password("passw0rd!").is_err());
        // missing lowercase
        assert!(validate_password("PASSW0RD!").is_err());
        // missing digit
        assert!(validate_password("Password!").is_err());
        // missing special
        assert!(validate_password("Passw0rdd").is_err());
        // character outside the allowed class
        assert!(validate_password("Passw0rd#").is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("a.b+c@sub.domain.io"));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("user@nodot"));
        assert!(!validate_email("spaces in@example.com"));
    }

    #[test]
    fn test_auth_success_routes_by_profile_flag() {
        let (_dir, store) = temp_store();

        let mut response = AuthResponse {
            token: "tok-1".to_string(),
            user: User {
                email: "ada@example.com".to_string(),
                is_profile_complete: true,
                ..Default::default()
            },
        };
        assert_eq!(handle_auth_success(&store, &response).unwrap(), NextStep::Insights);
        assert_eq!(store.token().as_deref(), Some("tok-1"));

        let stored: User = store.get(keys::USER_DATA).unwrap().unwrap();
        assert_eq!(stored.email, "ada@example.com");
        let previous: PreviousUser = store.get(keys::PREVIOUS_USER_DATA).unwrap().unwrap();
        assert_eq!(previous.email, "ada@example.com");

        response.user.is_profile_complete = false;
        assert_eq!(
            handle_auth_success(&store, &response).unwrap(),
            NextStep::Onboarding
        );
    }

    #[test]
    fn test_require_auth_without_token() {
        let (_dir, store) = temp_store();
        let err = require_auth(&store).unwrap_err();
        assert!(err.to_string().contains("jobnest login"));

        store.set_token("tok").unwrap();
        assert_eq!(require_auth(&store).unwrap(), "tok");
    }

    #[test]
    fn test_code_challenge_matches_rfc7636_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 64);
        assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(verifier, generate_code_verifier());
    }

    #[test]
    fn test_begin_google_auth_stores_verifier() {
        let (_dir, store) = temp_store();
        let config = Config {
            api_url: "http://localhost:8000".to_string(),
            google_client_id: "client-id-123".to_string(),
            redirect_uri: "http://localhost:5173/jobnest/auth".to_string(),
            log_filter: "warn".to_string(),
        };

        let url = begin_google_auth(&store, &config).unwrap();

        let verifier: String = store.get(keys::CODE_VERIFIER).unwrap().unwrap();
        assert!(url.starts_with(GOOGLE_AUTH_ENDPOINT));
        assert!(url.contains("client-id-123"));
        assert!(url.contains(&code_challenge(&verifier)));
        assert!(url.contains("code_challenge_method=S256"));
    }
}
