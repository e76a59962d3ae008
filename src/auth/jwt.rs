use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Signs bearer tokens for authenticated users.
///
/// The secret is handed over once at construction and never changes.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    #[cfg(test)]
    decoding: jsonwebtoken::DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            #[cfg(test)]
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn from_config(cfg: JwtConfig) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
        } = cfg;
        Self::new(secret.into_bytes(), issuer, audience)
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(TOKEN_TTL.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Decode and validate a token issued by this issuer.
    #[cfg(test)]
    pub(crate) fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = jsonwebtoken::Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_issuer(secret: &str, issuer: &str, audience: &str) -> TokenIssuer {
        TokenIssuer::from_config(JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    #[test]
    fn issue_and_verify_token() {
        let issuer = make_issuer("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id).expect("issue");
        let claims = issuer.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn token_expires_after_twenty_four_hours() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = make_issuer("dev-secret", "iss", "aud");
        let two_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = issuer.issue_at(Uuid::new_v4(), two_days_ago).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_issuer("secret-a", "iss", "aud");
        let bad = make_issuer("secret-b", "iss", "aud");
        let token = good.issue(Uuid::new_v4()).unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_issuer("same-secret", "good-iss", "good-aud");
        let bad = make_issuer("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4()).unwrap();
        let err = bad.verify(&token).unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
