//! Authentication collaborator.
//!
//! `Authenticator` is the contract the service needs from an identity provider
//! (email/password sign-up and sign-in, bearer sessions). `InMemoryAuthenticator`
//! is a development stand-in only: accounts live in process memory and vanish on restart.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::User;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email address.")]
    InvalidEmail,
    #[error("Password should be at least 6 characters.")]
    WeakPassword,
    #[error("Email already in use.")]
    EmailInUse,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("Session expired or unknown. Please sign in again.")]
    UnknownSession,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub trait Authenticator: Send + Sync + 'static {
    fn sign_up(&self, email: &str, password: &str) -> impl Future<Output = Result<Session, AuthError>> + Send;
    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = Result<Session, AuthError>> + Send;
    fn sign_out(&self, token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
    /// User behind a bearer token, if the session is live.
    fn resolve(&self, token: &str) -> impl Future<Output = Option<User>> + Send;
}

struct Account {
    uid: String,
    password: String,
}

#[derive(Clone, Default)]
pub struct InMemoryAuthenticator {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    sessions: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    async fn open_session(&self, user: User) -> Session {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user.clone());
        Session { token, user }
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

impl Authenticator for InMemoryAuthenticator {
    #[instrument(level = "info", skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let uid = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                warn!(target: "medsky_backend", %email, "Sign-up rejected: email in use");
                return Err(AuthError::EmailInUse);
            }
            let uid = Uuid::new_v4().to_string();
            accounts.insert(email.clone(), Account { uid: uid.clone(), password: password.to_string() });
            uid
        };
        info!(target: "medsky_backend", %email, %uid, "Account created");
        Ok(self.open_session(User { uid, email }).await)
    }

    #[instrument(level = "info", skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let uid = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email) {
                Some(acc) if acc.password == password => acc.uid.clone(),
                _ => {
                    warn!(target: "medsky_backend", %email, "Sign-in rejected");
                    return Err(AuthError::InvalidCredentials);
                }
            }
        };
        Ok(self.open_session(User { uid, email }).await)
    }

    #[instrument(level = "info", skip(self, token))]
    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .write()
            .await
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::UnknownSession)
    }

    async fn resolve(&self, token: &str) -> Option<User> {
        self.sessions.read().await.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in_reuses_uid() {
        let auth = InMemoryAuthenticator::new();
        let first = auth.sign_up("Doc@Example.org", "secret1").await.unwrap();
        assert_eq!(first.user.email, "doc@example.org");

        let second = auth.sign_in("doc@example.org", "secret1").await.unwrap();
        assert_eq!(second.user.uid, first.user.uid);
        assert_ne!(second.token, first.token);
        assert_eq!(auth.resolve(&second.token).await, Some(second.user));
    }

    #[tokio::test]
    async fn sign_up_validates_input() {
        let auth = InMemoryAuthenticator::new();
        assert_eq!(auth.sign_up("no-at-sign", "secret1").await, Err(AuthError::InvalidEmail));
        assert_eq!(auth.sign_up("@example.org", "secret1").await, Err(AuthError::InvalidEmail));
        assert_eq!(auth.sign_up("a@b.c", "123").await, Err(AuthError::WeakPassword));

        auth.sign_up("a@b.c", "123456").await.unwrap();
        assert_eq!(auth.sign_up("A@B.C", "abcdef").await, Err(AuthError::EmailInUse));
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_email_is_rejected() {
        let auth = InMemoryAuthenticator::new();
        auth.sign_up("a@b.c", "123456").await.unwrap();
        assert_eq!(auth.sign_in("a@b.c", "654321").await, Err(AuthError::InvalidCredentials));
        assert_eq!(auth.sign_in("x@b.c", "123456").await, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token() {
        let auth = InMemoryAuthenticator::new();
        let session = auth.sign_up("a@b.c", "123456").await.unwrap();
        auth.sign_out(&session.token).await.unwrap();
        assert_eq!(auth.resolve(&session.token).await, None);
        assert_eq!(auth.sign_out(&session.token).await, Err(AuthError::UnknownSession));
    }
}
