//! Session tokens and the registry of live sessions
//!
//! Tokens are HS256 JWTs carrying a session id. A token is only honoured
//! while its session id is still registered, which lets logout and
//! password changes revoke tokens before they expire.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ShopError, ShopResult},
    middleware::AuthContext,
    models::{Role, User},
};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: u32,
    pub username: String,
    pub role: Role,
    /// Session ID
    pub sid: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    user_id: u32,
    expires_at: u64,
}

/// A freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session_id: Uuid,
}

#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
    sessions: Arc<Mutex<HashMap<Uuid, SessionRecord>>>,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a session for `user` and sign a token for it
    pub async fn issue(&self, user: &User) -> ShopResult<IssuedSession> {
        let now = now_seconds()?;
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            sid: Uuid::new_v4(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ShopError::Internal(format!("Failed to sign session token: {}", e)))?;

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, record| record.expires_at > now);
        sessions.insert(
            claims.sid,
            SessionRecord {
                user_id: user.id,
                expires_at: claims.exp,
            },
        );

        info!("Opened session {} for user {}", claims.sid, user.id);
        Ok(IssuedSession {
            token,
            session_id: claims.sid,
        })
    }

    /// Resolve a bearer token to the identity it was issued for
    pub async fn validate(&self, token: &str) -> ShopResult<AuthContext> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!("Rejected session token: {}", e);
                ShopError::Unauthorized
            })?
            .claims;

        let sessions = self.sessions.lock().await;
        match sessions.get(&claims.sid) {
            Some(record) if record.user_id == claims.sub => Ok(AuthContext {
                user_id: claims.sub,
                username: claims.username,
                role: claims.role,
                session_id: claims.sid,
            }),
            _ => Err(ShopError::Unauthorized),
        }
    }

    /// End one session
    pub async fn revoke(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&session_id).is_some();
        if removed {
            info!("Closed session {}", session_id);
        }
        removed
    }

    /// End every session of `user_id` except `keep`
    pub async fn revoke_others(&self, user_id: u32, keep: Uuid) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|sid, record| record.user_id != user_id || *sid == keep);
        let revoked = before - sessions.len();

        info!("Closed {} other sessions of user {}", revoked, user_id);
        revoked
    }

    /// Session lifetime in seconds
    pub fn ttl(&self) -> u64 {
        self.ttl_seconds
    }
}

fn now_seconds() -> ShopResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ShopError::Internal(format!("Failed to get current time: {}", e)))
}
