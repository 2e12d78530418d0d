use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sid: Uuid,
    exp: usize,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Server-side sessions keyed by a random id. The browser holds the id inside
/// an HS256-signed token, so a forged or edited cookie never resolves.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Starts a session for `user_id` and returns the signed cookie token.
    pub fn create(&self, user_id: Uuid) -> Result<String, AppError> {
        let sid = Uuid::new_v4();
        let expires_at = Utc::now() + self.ttl;
        let claims = Claims {
            sid,
            exp: expires_at.timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("session token signing failed: {}", e)))?;

        self.sessions.insert(sid, SessionEntry { user_id, expires_at });
        Ok(token)
    }

    /// Session id and user for a cookie token, if the token is authentic and
    /// the session is live.
    pub fn resolve(&self, token: &str) -> Option<(Uuid, Uuid)> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected session token: {}", e);
                return None;
            }
        };

        let entry = self.sessions.get(&claims.sid)?.value().clone();
        if entry.expires_at <= Utc::now() {
            self.sessions.remove(&claims.sid);
            return None;
        }
        Some((claims.sid, entry.user_id))
    }

    pub fn destroy(&self, sid: Uuid) {
        self.sessions.remove(&sid);
    }

    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `Set-Cookie` value binding the browser to a session. No `Max-Age`, so the
/// cookie ends with the browser session.
pub fn session_cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        SESSION_COOKIE, token
    ))
    .unwrap_or_else(|_| clear_session_cookie())
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Per-request identity: anonymous, or signed in as `user_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub session_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl RequestContext {
    /// Drops any session this request carries.
    pub fn clear(&self, sessions: &SessionStore) {
        if let Some(sid) = self.session_id {
            sessions.destroy(sid);
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let resolved = token_from_headers(&parts.headers).and_then(|t| state.sessions.resolve(t));
        Ok(match resolved {
            Some((sid, user_id)) => RequestContext {
                session_id: Some(sid),
                user_id: Some(user_id),
            },
            None => RequestContext::default(),
        })
    }
}

/// A signed-in user whose account still exists. Rejects with a redirect to
/// `/login`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = match RequestContext::from_request_parts(parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };
        let (Some(sid), Some(user_id)) = (ctx.session_id, ctx.user_id) else {
            return Err(AppError::AuthRequired);
        };

        match db::user_queries::fetch_one(&state.pool, user_id).await {
            Ok(Some(_)) => Ok(AuthUser(user_id)),
            Ok(None) => {
                state.sessions.destroy(sid);
                Err(AppError::AuthRequired)
            }
            Err(e) => {
                error!("Failed to load session user {}: {}", user_id, e);
                Err(AppError::Db(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(b"0123456789abcdef0123456789abcdef", Duration::minutes(30))
    }

    #[test]
    fn test_create_and_resolve() {
        let sessions = store();
        let user_id = Uuid::new_v4();

        let token = sessions.create(user_id).unwrap();
        let (sid, resolved) = sessions.resolve(&token).unwrap();
        assert_eq!(resolved, user_id);

        sessions.destroy(sid);
        assert!(sessions.resolve(&token).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_tampered_or_foreign_tokens_are_rejected() {
        let sessions = store();
        let token = sessions.create(Uuid::new_v4()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(sessions.resolve(&tampered).is_none());
        assert!(sessions.resolve("garbage").is_none());

        let other = SessionStore::new(b"another-secret-another-secret-123", Duration::minutes(30));
        assert!(other.resolve(&token).is_none());
    }

    #[test]
    fn test_expired_sessions_do_not_resolve() {
        let sessions = SessionStore::new(b"0123456789abcdef0123456789abcdef", Duration::minutes(-5));
        let token = sessions.create(Uuid::new_v4()).unwrap();
        assert!(sessions.resolve(&token).is_none());

        sessions.create(Uuid::new_v4()).unwrap();
        sessions.purge_expired();
        assert_eq!(sessions.len(), 0);
    }

    #[test]
    fn test_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def.ghi; other=1"));
        assert_eq!(token_from_headers(&headers), Some("abc.def.ghi"));

        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert_eq!(token_from_headers(&headers), None);

        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc");
        let text = cookie.to_str().unwrap();
        assert!(text.starts_with("session=abc;"));
        assert!(text.contains("HttpOnly"));
        assert!(clear_session_cookie().to_str().unwrap().contains("Max-Age=0"));
    }
}
