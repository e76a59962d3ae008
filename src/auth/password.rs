use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

const DECOY_PASSWORD: &str = "decoy-credential-never-matches";

/// One-way password hashing with Argon2id and a fresh salt per call.
///
/// The PHC string returned by [`hash`](Self::hash) embeds algorithm, cost
/// parameters and salt, so [`verify`](Self::verify) needs nothing else.
///
/// Construction also hashes a decoy credential with the same parameters;
/// it is checked when a login email is unknown so that branch pays the
/// same Argon2 cost as a wrong password, starting with the first request.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: Arc<str>,
}

impl CredentialHasher {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_argon2(Argon2::default())
    }

    /// Minimum-cost parameters, only for tests that hash in bulk.
    #[cfg(test)]
    pub(crate) fn fast() -> Self {
        let params = argon2::Params::new(8, 1, 1, None).expect("valid argon2 params");
        Self::with_argon2(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
        .expect("decoy digest")
    }

    fn with_argon2(argon2: Argon2<'static>) -> anyhow::Result<Self> {
        let decoy = hash_with(&argon2, DECOY_PASSWORD)?;
        Ok(Self {
            argon2,
            decoy: decoy.into(),
        })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        hash_with(&self.argon2, plain)
    }

    /// True iff `plain` matches `digest`. A digest that does not parse is
    /// treated as a mismatch.
    pub fn verify(&self, digest: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password digest is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification on the decoy digest.
    pub fn verify_decoy(&self, plain: &str) {
        let _ = self.verify(&self.decoy, plain);
    }

    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    pub async fn verify_blocking(&self, digest: String, plain: String) -> anyhow::Result<bool> {
        let hasher = self.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&digest, &plain)).await?)
    }

    pub async fn verify_decoy_blocking(&self, plain: String) -> anyhow::Result<()> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&plain)).await?;
        Ok(())
    }
}

fn hash_with(argon2: &Argon2<'_>, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}
