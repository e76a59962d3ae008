use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::{User, UserPatch};
use crate::{
    auth::{CredentialHasher, TokenIssuer},
    db::StoreError,
    error::{AppError, AppResult},
};

/// Same text for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "invalid email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::invalid("email is required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::invalid("invalid email"));
    }
    Ok(())
}

pub fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    if raw.is_empty() {
        return Err(AppError::invalid("user id is required"));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::invalid(format!("invalid user id: {raw}")))
}

fn email_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::UniqueViolation => AppError::Conflict("email already registered".into()),
        other => other.into(),
    }
}

fn unauthenticated() -> AppError {
    AppError::Unauthenticated(INVALID_CREDENTIALS.into())
}

/// Registration, login and profile management.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    issuer: Arc<TokenIssuer>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            store,
            hasher,
            issuer,
        }
    }

    #[instrument(skip(self, password, full_name))]
    pub async fn register(&self, email: String, password: String, full_name: String) -> AppResult<User> {
        validate_email(&email)?;
        if password.is_empty() {
            return Err(AppError::invalid("password is required"));
        }

        // Friendlier error only; the unique index decides under concurrency.
        if self.store.find_by_email(&email).await?.is_some() {
            warn!("email already registered");
            return Err(AppError::Conflict("email already registered".into()));
        }

        let password_hash = self.hasher.hash_blocking(password).await?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            full_name,
            created_at: OffsetDateTime::now_utc(),
        };
        let user = self.store.insert(&user).await.map_err(email_conflict)?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: String, password: String) -> AppResult<String> {
        let Some(user) = self.store.find_by_email(&email).await? else {
            self.hasher.verify_decoy_blocking(password).await?;
            warn!("login unknown email");
            return Err(unauthenticated());
        };

        let ok = self
            .hasher
            .verify_blocking(user.password_hash.clone(), password)
            .await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(unauthenticated());
        }

        let token = self.issuer.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> AppResult<User> {
        let id = parse_user_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: UserPatch) -> AppResult<User> {
        let id = parse_user_id(id)?;
        if let Some(email) = patch.email.as_deref() {
            validate_email(email)?;
        }
        if patch.password.as_deref() == Some("") {
            return Err(AppError::invalid("password must not be empty"));
        }

        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))?;

        if let Some(email) = patch.email {
            if email != user.email {
                if let Some(other) = self.store.find_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(AppError::Conflict("email already registered".into()));
                    }
                }
            }
            user.email = email;
        }
        if let Some(password) = patch.password {
            user.password_hash = self.hasher.hash_blocking(password).await?;
        }
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }

        if !self.store.update(&user).await.map_err(email_conflict)? {
            return Err(AppError::not_found("user", id));
        }
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_user_id(id)?;
        if !self.store.delete(id).await? {
            return Err(AppError::not_found("user", id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    // TODO: page this like ListAddress once clients send page/limit.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.store.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::StoreResult;
    use crate::users::repo::memory::MemoryUserStore;

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(b"test-secret", "test-issuer", "test-aud"))
    }

    fn service_with(store: Arc<dyn UserStore>) -> UserService {
        UserService::new(store, CredentialHasher::fast(), issuer())
    }

    fn service() -> UserService {
        service_with(Arc::new(MemoryUserStore::default()))
    }

    async fn register_alice(svc: &UserService) -> User {
        svc.register("alice@example.com".into(), "hunter22".into(), "Alice Liddell".into())
            .await
            .expect("register")
    }

    #[tokio::test]
    async fn register_then_get_hides_credential() {
        let svc = service();
        let created = register_alice(&svc).await;

        let fetched = svc.get(&created.id.to_string()).await.unwrap();
        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.full_name, "Alice Liddell");
        assert_ne!(fetched.password_hash, "hunter22");

        let json = serde_json::to_value(&fetched).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn email_is_stored_exactly_as_given() {
        let svc = service();
        let user = svc
            .register("Bob@Example.COM".into(), "pw".into(), String::new())
            .await
            .unwrap();
        assert_eq!(user.email, "Bob@Example.COM");
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_and_leaves_one_row() {
        let svc = service();
        register_alice(&svc).await;
        let err = svc
            .register("alice@example.com".into(), "other".into(), "Imposter".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_email_or_password_is_invalid() {
        let svc = service();
        let err = svc
            .register(String::new(), "pw".into(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = svc
            .register("a@b.io".into(), String::new(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = svc
            .register("not-an-email".into(), "pw".into(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn login_returns_token_for_registered_user() {
        let issuer = issuer();
        let svc = UserService::new(
            Arc::new(MemoryUserStore::default()),
            CredentialHasher::fast(),
            issuer.clone(),
        );
        let user = register_alice(&svc).await;

        let token = svc
            .login("alice@example.com".into(), "hunter22".into())
            .await
            .unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let svc = service();
        register_alice(&svc).await;

        let wrong_password = svc
            .login("alice@example.com".into(), "wrong".into())
            .await
            .unwrap_err();
        let unknown_email = svc
            .login("nobody@example.com".into(), "hunter22".into())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthenticated(_)));
        assert_eq!(wrong_password.code(), unknown_email.code());
        assert_eq!(wrong_password.status(), unknown_email.status());
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn password_only_update_keeps_profile_and_rotates_credential() {
        let svc = service();
        let user = register_alice(&svc).await;

        let patch = UserPatch {
            password: Some("n3w-pass".into()),
            ..Default::default()
        };
        let updated = svc.update(&user.id.to_string(), patch).await.unwrap();
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.full_name, user.full_name);

        assert!(svc
            .login("alice@example.com".into(), "n3w-pass".into())
            .await
            .is_ok());
        let err = svc
            .login("alice@example.com".into(), "hunter22".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn full_name_can_be_cleared() {
        let svc = service();
        let user = register_alice(&svc).await;
        let patch = UserPatch {
            full_name: Some(String::new()),
            ..Default::default()
        };
        let updated = svc.update(&user.id.to_string(), patch).await.unwrap();
        assert_eq!(updated.full_name, "");
        assert_eq!(updated.email, "alice@example.com");
    }

    #[tokio::test]
    async fn update_rejects_empty_password_and_taken_email() {
        let svc = service();
        let alice = register_alice(&svc).await;
        svc.register("bob@example.com".into(), "pw".into(), "Bob".into())
            .await
            .unwrap();

        let err = svc
            .update(
                &alice.id.to_string(),
                UserPatch {
                    password: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = svc
            .update(
                &alice.id.to_string(),
                UserPatch {
                    email: Some("bob@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_or_malformed_ids() {
        let svc = service();
        let missing = Uuid::new_v4().to_string();

        assert!(matches!(svc.get(&missing).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update(&missing, UserPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete(&missing).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.get("42").await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(svc.delete("").await, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let svc = service();
        let user = register_alice(&svc).await;
        svc.delete(&user.id.to_string()).await.unwrap();
        assert!(matches!(
            svc.get(&user.id.to_string()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(svc.list().await.unwrap().is_empty());
    }

    /// Misses every pre-check lookup, as a concurrent writer would.
    #[derive(Default)]
    struct RacingStore(MemoryUserStore);

    #[async_trait]
    impl UserStore for RacingStore {
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
            self.0.find_by_id(id).await
        }
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }
        async fn insert(&self, user: &User) -> StoreResult<User> {
            self.0.insert(user).await
        }
        async fn update(&self, user: &User) -> StoreResult<bool> {
            self.0.update(user).await
        }
        async fn delete(&self, id: Uuid) -> StoreResult<bool> {
            self.0.delete(id).await
        }
        async fn list(&self) -> StoreResult<Vec<User>> {
            self.0.list().await
        }
    }

    #[tokio::test]
    async fn storage_uniqueness_violation_surfaces_as_conflict() {
        let svc = service_with(Arc::new(RacingStore::default()));
        register_alice(&svc).await;
        let err = svc
            .register("alice@example.com".into(), "pw".into(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
        async fn insert(&self, _user: &User) -> StoreResult<User> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
        async fn update(&self, _user: &User) -> StoreResult<bool> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
        async fn delete(&self, _id: Uuid) -> StoreResult<bool> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
        async fn list(&self) -> StoreResult<Vec<User>> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn backend_failure_is_internal() {
        let svc = service_with(Arc::new(BrokenStore));
        let err = svc.delete(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        let err = svc
            .login("alice@example.com".into(), "pw".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
