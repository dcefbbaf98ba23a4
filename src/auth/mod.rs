//! Authentication module
//!
//! Bearer tokens, salted password hashes and account roles.

pub mod accounts;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Account role; admins may manage the element, avatar and map catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,64}$").expect("username pattern"));

/// Usernames are 3-64 characters of letters, digits, `.`, `_` or `-`
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Generate a random 256-bit bearer token, hex encoded
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    hex::encode(random_bytes)
}

/// Salted SHA-256 password digest as stored in the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub salt: String,
    pub hash: String,
}

impl PasswordHash {
    /// Hash `password` under a fresh random salt
    pub fn new(password: &str) -> Self {
        let salt_bytes: [u8; 16] = rand::rng().random();
        Self::with_salt(password, &hex::encode(salt_bytes))
    }

    pub fn with_salt(password: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        Self {
            salt: salt.to_string(),
            hash: hex::encode(hasher.finalize()),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        Self::with_salt(password, &self.salt).hash == self.hash
    }
}
