//! Dashboard Login
//!
//! Pluggable credential check. `StaticCredentials` is a placeholder with a
//! single configured account; a real identity provider implements
//! [`Authenticator`] instead.

use sha2::{Digest, Sha256};

use crate::constants;

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// One account, password kept only as a salted SHA-256 digest
pub struct StaticCredentials {
    username: String,
    password_hash: String,
}

impl StaticCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password_hash: hash_password(password, username),
        }
    }

    /// `DASHBOARD_USERNAME` / `DASHBOARD_PASSWORD` or the built-in defaults
    pub fn from_env() -> Self {
        Self::new(
            &constants::get_login_username(),
            &constants::get_login_password(),
        )
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Authenticator for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            log::warn!("Login rejected for unknown user: {}", username);
            return false;
        }

        let ok = hash_password(password, username) == self.password_hash;
        if !ok {
            log::warn!("Login rejected for {}: invalid credentials", username);
        }
        ok
    }
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", password, salt));
    format!("{:x}", hasher.finalize())
}
