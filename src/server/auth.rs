//! Authentication for the API, streaming and the web UI.
//!
//! Two credentials are accepted: a static API key sent as a Bearer token,
//! and a session cookie issued by [`login`]. Session cookies carry the
//! username and expiry, signed with HMAC-SHA256.

use crate::config::AuthConfig;
use crate::server::{error::AppError, AppContext};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

const SESSION_COOKIE_NAME: &str = "mediacast_session";

type HmacSha256 = Hmac<Sha256>;

/// Identity of an authenticated caller, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl AuthUser {
    fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    fn api_key() -> Self {
        Self("api".to_string())
    }
}

/// Login request payload
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl LoginResponse {
    fn failure(message: &str) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.to_string(),
            expires_at: None,
        })
    }
}

/// Session data stored in the cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionData {
    username: String,
    /// Unix timestamp in seconds.
    expires_at: i64,
}

impl SessionData {
    fn new(username: &str, timeout_hours: u64) -> Self {
        let lifetime = i64::try_from(timeout_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        Self {
            username: username.to_string(),
            expires_at: Utc::now().timestamp().saturating_add(lifetime),
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().timestamp() < self.expires_at
    }

    /// `<base64 json>.<hex hmac>`
    fn encode(&self, key: &[u8]) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = sign(key, payload.as_bytes())
            .map(hex::encode)
            .unwrap_or_default();
        format!("{}.{}", payload, signature)
    }

    fn decode(value: &str, key: &[u8]) -> Option<Self> {
        let (payload, signature) = value.split_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = HmacSha256::new_from_slice(key).ok()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }
}

fn sign(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(data);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Key for signing session cookies.
///
/// Uses the configured secret, or 32 random bytes when none is set.
pub fn session_key(auth_config: &AuthConfig) -> Vec<u8> {
    match &auth_config.session_secret {
        Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
        _ => {
            if auth_config.enabled {
                tracing::info!("No session_secret configured, sessions will not survive a restart");
            }
            let bytes: [u8; 32] = rand::thread_rng().gen();
            bytes.to_vec()
        }
    }
}

/// Resolve the caller from its credentials.
///
/// Everyone is `anonymous` while authentication is disabled.
pub fn authenticate(
    auth_config: &AuthConfig,
    key: &[u8],
    bearer_token: Option<&str>,
    session_cookie: Option<&str>,
) -> Option<AuthUser> {
    if !auth_config.enabled {
        return Some(AuthUser::anonymous());
    }

    // API key first, for programmatic access
    if let (Some(token), Some(api_key)) = (bearer_token, auth_config.api_key.as_deref()) {
        if token == api_key {
            return Some(AuthUser::api_key());
        }
    }

    session_cookie
        .and_then(|value| SessionData::decode(value, key))
        .filter(SessionData::is_valid)
        .map(|session| AuthUser(session.username))
}

/// [`authenticate`] using request extractors.
pub fn identify(
    ctx: &AppContext,
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    jar: &CookieJar,
) -> Option<AuthUser> {
    authenticate(
        &ctx.config.server.auth,
        &ctx.session_key,
        bearer.map(|b| b.token()),
        jar.get(SESSION_COOKIE_NAME).map(|c| c.value()),
    )
}

/// Rejects unauthenticated API requests and records the caller.
pub async fn api_auth_middleware(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = identify(&ctx, bearer.as_ref(), &jar).ok_or_else(AppError::unauthorized)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Login handler
pub async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), (StatusCode, Json<LoginResponse>)> {
    let auth_config = &ctx.config.server.auth;

    let (Some(expected_username), Some(password_hash)) =
        (&auth_config.username, &auth_config.password_hash)
    else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            LoginResponse::failure("Authentication not configured"),
        ));
    };

    let invalid = || {
        tracing::info!(username = %payload.username, "Rejected login");
        (StatusCode::UNAUTHORIZED, LoginResponse::failure("Invalid credentials"))
    };

    if payload.username != *expected_username {
        return Err(invalid());
    }
    if !bcrypt::verify(&payload.password, password_hash).unwrap_or(false) {
        return Err(invalid());
    }

    let session = SessionData::new(&payload.username, auth_config.session_timeout_hours);
    let expires_at = session.expires_at;

    let cookie = Cookie::build((SESSION_COOKIE_NAME, session.encode(&ctx.session_key)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(
            i64::try_from(auth_config.session_timeout_hours).unwrap_or(i64::MAX / 3600),
        ))
        .build();

    tracing::info!(username = %payload.username, "Login successful");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            expires_at: Some(expires_at),
        }),
    ))
}

/// Logout handler
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();

    (jar.remove(cookie), StatusCode::OK)
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub auth_enabled: bool,
    pub authenticated: bool,
    pub username: Option<String>,
}

/// Check current auth status
pub async fn auth_status(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
) -> Json<AuthStatusResponse> {
    let auth_config = &ctx.config.server.auth;

    if !auth_config.enabled {
        return Json(AuthStatusResponse {
            auth_enabled: false,
            authenticated: true,
            username: None,
        });
    }

    let user = identify(&ctx, bearer.as_ref(), &jar);
    let username = jar
        .get(SESSION_COOKIE_NAME)
        .and_then(|c| SessionData::decode(c.value(), &ctx.session_key))
        .filter(SessionData::is_valid)
        .map(|s| s.username);

    Json(AuthStatusResponse {
        auth_enabled: true,
        authenticated: user.is_some(),
        username,
    })
}

/// Generate a bcrypt password hash
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Generate a random API key
pub fn generate_api_key() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-session-key";

    fn enabled() -> AuthConfig {
        AuthConfig {
            enabled: true,
            api_key: Some("secret-key".to_string()),
            username: Some("admin".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_round_trip() {
        let session = SessionData::new("admin", 1);
        let encoded = session.encode(KEY);
        assert_eq!(SessionData::decode(&encoded, KEY), Some(session));
    }

    #[test]
    fn test_session_rejects_tampering() {
        let encoded = SessionData::new("admin", 1).encode(KEY);
        assert!(SessionData::decode(&encoded, b"other-key").is_none());

        let (_, signature) = encoded.split_once('.').unwrap();
        let forged = SessionData {
            username: "root".to_string(),
            expires_at: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_cookie = format!("{}.{}", forged_payload, signature);
        assert!(SessionData::decode(&forged_cookie, KEY).is_none());

        assert!(SessionData::decode("garbage", KEY).is_none());
    }

    #[test]
    fn test_expired_session() {
        let session = SessionData {
            username: "admin".to_string(),
            expires_at: Utc::now().timestamp() - 1,
        };
        assert!(!session.is_valid());
        let cookie = session.encode(KEY);
        assert!(authenticate(&enabled(), KEY, None, Some(&cookie)).is_none());
    }

    #[test]
    fn test_authenticate() {
        let config = enabled();
        assert_eq!(
            authenticate(&config, KEY, Some("secret-key"), None),
            Some(AuthUser::api_key())
        );
        assert!(authenticate(&config, KEY, Some("wrong"), None).is_none());
        assert!(authenticate(&config, KEY, None, None).is_none());

        let cookie = SessionData::new("admin", 1).encode(KEY);
        assert_eq!(
            authenticate(&config, KEY, None, Some(&cookie)),
            Some(AuthUser("admin".to_string()))
        );
    }

    #[test]
    fn test_disabled_auth_allows_everyone() {
        let config = AuthConfig::default();
        assert_eq!(authenticate(&config, KEY, None, None), Some(AuthUser::anonymous()));
    }

    #[test]
    fn test_session_key() {
        let mut config = enabled();
        let a = session_key(&config);
        let b = session_key(&config);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);

        config.session_secret = Some("fixed".to_string());
        assert_eq!(session_key(&config), b"fixed".to_vec());
    }

    #[test]
    fn test_generated_credentials() {
        let key = generate_api_key();
        assert_eq!(key.len(), 43);
        assert_ne!(key, generate_api_key());

        let hash = hash_password("hunter2").unwrap();
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
        assert!(!bcrypt::verify("hunter3", &hash).unwrap());
    }
}
