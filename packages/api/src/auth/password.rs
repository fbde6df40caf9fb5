//! # Password hashing and verification — keyed Argon2id
//!
//! [`Passwords`] owns the hashing configuration shared by login and user
//! creation:
//!
//! - every hash gets a fresh random salt from [`OsRng`] and is stored as a
//!   PHC string (`$argon2id$v=19$m=…,t=…,p=…$salt$hash`);
//! - when a pepper is configured it is fed to Argon2 as its secret key, so a
//!   leaked `user` table alone is not enough to mount an offline attack;
//! - verification reads the cost parameters back from the PHC string and the
//!   final comparison is done by `argon2` in constant time.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::AuthError;

#[derive(Clone)]
pub struct Passwords {
    pepper: Option<Arc<[u8]>>,
    params: Params,
}

impl Default for Passwords {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for Passwords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passwords")
            .field("peppered", &self.pepper.is_some())
            .field("params", &self.params)
            .finish()
    }
}

impl Passwords {
    pub fn new(pepper: Option<&str>) -> Self {
        Self {
            pepper: pepper
                .filter(|p| !p.is_empty())
                .map(|p| Arc::from(p.as_bytes())),
            params: Params::default(),
        }
    }

    /// Override the Argon2 cost parameters used for new hashes.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    fn argon2(&self) -> Result<Argon2<'_>, AuthError> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(
                &pepper[..],
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
            .map_err(|e| AuthError::Hashing(e.to_string())),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }

    /// Hash a password. Returns a PHC-format string.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a PHC-format hash string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Hashing(format!("invalid password hash: {e}")))?;
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
pub(crate) fn cheap() -> Passwords {
    Passwords::default().with_params(test_params())
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params::new(1024, 1, 1, None).unwrap()
}
