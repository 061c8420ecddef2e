//! Account operations delegated to a hosted authentication backend

use crate::error::{FieldViolation, QamusError};
use crate::validation::{check_email, check_password_strength};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AuthProviderError {
    /// The backend rejected the request (bad credentials, duplicate account, ...).
    #[error("{0}")]
    Rejected(String),

    #[error("authentication backend unavailable: {0}")]
    Transport(String),

    #[error("{0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for AuthProviderError {
    fn from(e: reqwest::Error) -> Self {
        AuthProviderError::Transport(e.to_string())
    }
}

impl From<AuthProviderError> for QamusError {
    fn from(e: AuthProviderError) -> Self {
        QamusError::Auth(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// What the backend hands back after sign-up or sign-in. Either part may be
/// missing, e.g. a sign-up awaiting email confirmation has no session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthProviderError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthProviderError>;
    /// Remove the application profile row owned by `user_id`.
    async fn delete_profile(&self, access_token: &str, user_id: &str) -> Result<(), AuthProviderError>;
    /// Remove the account itself.
    async fn delete_user(&self, user_id: &str) -> Result<(), AuthProviderError>;
}

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub async fn register(&self, command: &AuthCommand) -> Result<AuthResponse, QamusError> {
        let mut violations = Vec::new();
        check_email(&command.email, &mut violations);
        check_password_strength(&command.password, &mut violations);
        if !violations.is_empty() {
            return Err(QamusError::InvalidParameters(violations));
        }

        let outcome = self.provider.sign_up(&command.email, &command.password).await.map_err(|e| {
            warn!(error = %e, "sign-up rejected");
            QamusError::from(e)
        })?;

        let user = outcome
            .user
            .ok_or_else(|| QamusError::Auth("Registration failed - no user created".to_string()))?;
        let session = outcome
            .session
            .ok_or_else(|| QamusError::Auth("Registration failed - no session created".to_string()))?;

        info!(user_id = %user.id, "account registered");
        Ok(Self::response(session, user, &command.email))
    }

    pub async fn login(&self, command: &AuthCommand) -> Result<AuthResponse, QamusError> {
        let mut violations = Vec::new();
        check_email(&command.email, &mut violations);
        if command.password.is_empty() {
            violations.push(FieldViolation::new("password", "Password is required"));
        }
        if !violations.is_empty() {
            return Err(QamusError::InvalidParameters(violations));
        }

        let outcome = self.provider.sign_in(&command.email, &command.password).await?;
        match (outcome.user, outcome.session) {
            (Some(user), Some(session)) => Ok(Self::response(session, user, &command.email)),
            _ => Err(QamusError::Auth("Login failed".to_string())),
        }
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), QamusError> {
        self.provider.sign_out(access_token).await?;
        Ok(())
    }

    /// Delete the profile row, then the account, then end the session.
    pub async fn delete_account(&self, access_token: &str) -> Result<(), QamusError> {
        let user = self
            .provider
            .current_user(access_token)
            .await?
            .ok_or_else(|| QamusError::Auth("No authenticated user found".to_string()))?;

        self.provider.delete_profile(access_token, &user.id).await?;
        self.provider.delete_user(&user.id).await?;

        // The token may already be rejected once its user is gone.
        if let Err(e) = self.provider.sign_out(access_token).await {
            warn!(error = %e, user_id = %user.id, "sign-out after account deletion failed");
        }

        info!(user_id = %user.id, "account deleted");
        Ok(())
    }

    fn response(session: AuthSession, user: AuthUser, fallback_email: &str) -> AuthResponse {
        AuthResponse {
            token: session.access_token,
            user: UserInfo {
                id: user.id,
                email: user.email.unwrap_or_else(|| fallback_email.to_string()),
            },
        }
    }
}
