//! Session identity used to authorise saves and scope stored invoices.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub anonymous: bool,
}

/// Supplies the current session, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current(&self) -> Option<Session>;
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
}

/// Process-wide auth state: anonymous sign-in or a signed HS256 token whose
/// `sub` claim becomes the user id.
pub struct AuthSession {
    session: RwLock<Option<Session>>,
    jwt_secret: Option<String>,
}

impl AuthSession {
    pub fn signed_out(jwt_secret: Option<String>) -> Self {
        Self {
            session: RwLock::new(None),
            jwt_secret,
        }
    }

    /// Sign in with `initial_token` when one is provided, anonymously otherwise.
    /// A rejected token is logged and leaves the process without a session.
    pub async fn initialize(jwt_secret: Option<String>, initial_token: Option<&str>) -> Self {
        let auth = Self::signed_out(jwt_secret);

        match initial_token {
            Some(token) if !token.is_empty() => {
                if let Err(e) = auth.sign_in_with_token(token).await {
                    tracing::error!(error = %e, "Token sign-in failed");
                }
            }
            _ => {
                auth.sign_in_anonymously().await;
            }
        }

        auth
    }

    pub async fn sign_in_anonymously(&self) -> Session {
        let session = Session {
            user_id: Uuid::new_v4().to_string(),
            anonymous: true,
        };
        tracing::info!(user_id = %session.user_id, "Signed in anonymously");
        *self.session.write().await = Some(session.clone());
        session
    }

    pub async fn sign_in_with_token(&self, token: &str) -> Result<Session, AppError> {
        let secret = self.jwt_secret.as_deref().ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "Token sign-in requires AUTH_JWT_SECRET to be set"
            ))
        })?;

        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::Unauthorized(anyhow::anyhow!("Invalid token: {}", e)))?;

        let session = Session {
            user_id: token_data.claims.sub,
            anonymous: false,
        };
        tracing::info!(user_id = %session.user_id, "Signed in with token");
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn sign_out(&self) {
        *self.session.write().await = None;
    }
}

#[async_trait]
impl SessionProvider for AuthSession {
    async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}
