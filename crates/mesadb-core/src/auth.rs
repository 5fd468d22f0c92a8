//! Sign-in against the `users` table and the single persisted session.
//!
//! Credential checking sits behind [`CredentialVerifier`]; the store picks
//! [`DevCredential`] when the config carries a development password and
//! [`PasswordHashVerifier`] otherwise.

use crate::{
    db::{Store, identity::Timestamp, record::Record},
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use thiserror::Error as ThisError;

/// Table holding the accounts sign-in checks against.
pub const USERS_TABLE: &str = "users";

/// Field of a user record holding the stored password hash.
pub const PASSWORD_HASH_FIELD: &str = "password_hash";

const HASH_SCHEME: &str = "sha256";

///
/// AuthError
///

#[derive(Debug, ThisError)]
pub enum AuthError {
    #[error("no user with email '{email}'")]
    UserNotFound { email: String },

    #[error("invalid credentials")]
    InvalidCredentials,
}

impl From<AuthError> for InternalError {
    fn from(err: AuthError) -> Self {
        let class = match err {
            AuthError::UserNotFound { .. } => ErrorClass::NotFound,
            AuthError::InvalidCredentials => ErrorClass::Unauthorized,
        };

        Self::new(class, ErrorOrigin::Auth, err.to_string())
    }
}

///
/// Session
/// The signed-in user, reduced to what callers need.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Session {
    pub user_id: Value,
    pub email: String,
    pub signed_in_at: String,
}

///
/// CredentialVerifier
///

pub trait CredentialVerifier {
    /// Whether `password` is valid for the `user` record.
    fn verify(&self, user: &Record, password: &str) -> bool;
}

///
/// DevCredential
/// Accepts one fixed development password for every user.
///

#[derive(Clone, Debug)]
pub struct DevCredential {
    secret: String,
}

impl DevCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl CredentialVerifier for DevCredential {
    fn verify(&self, _user: &Record, password: &str) -> bool {
        constant_time_eq(self.secret.as_bytes(), password.as_bytes())
    }
}

///
/// PasswordHashVerifier
///
/// Checks the user's `password_hash` field, formatted
/// `sha256$<salt>$<hex digest of salt ++ password>`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordHashVerifier;

impl CredentialVerifier for PasswordHashVerifier {
    fn verify(&self, user: &Record, password: &str) -> bool {
        let Some(stored) = user.get(PASSWORD_HASH_FIELD).and_then(Value::as_text) else {
            return false;
        };
        let mut parts = stored.splitn(3, '$');
        let (Some(HASH_SCHEME), Some(salt), Some(_)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        constant_time_eq(hash_password(salt, password).as_bytes(), stored.as_bytes())
    }
}

/// Produce a `password_hash` value for `password` under `salt`.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    let mut out = format!("{HASH_SCHEME}${salt}$");
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }

    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

///
/// Auth
/// Store-bound sign-in, sign-out and session lookup.
///

pub struct Auth<'a> {
    store: &'a Store,
}

impl<'a> Auth<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Match `email` (case-insensitively) against `users`, verify the
    /// password and persist the resulting session.
    pub fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, InternalError> {
        let users = self.store.from(USERS_TABLE).select_all()?;
        let user = users
            .iter()
            .find(|user| {
                user.get("email")
                    .and_then(Value::as_text)
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .ok_or_else(|| AuthError::UserNotFound {
                email: email.to_string(),
            })?;

        if !self.store.verifier().verify(user, password) {
            tracing::warn!(email, "sign-in rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let session = Session {
            user_id: user.id().cloned().unwrap_or_default(),
            email: email.to_string(),
            signed_in_at: Timestamp::now()?.rfc3339,
        };
        self.store.persist_session(Some(&session))?;

        Ok(session)
    }

    /// Clear the session, in memory and on disk.
    pub fn sign_out(&self) -> Result<(), InternalError> {
        self.store.persist_session(None)
    }

    /// The active session; `None` simply means nobody is signed in.
    #[must_use]
    pub fn get_session(&self) -> Option<Session> {
        self.store.session()
    }
}

///
/// TESTS
///
