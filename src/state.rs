use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    addresses::{AddressService, PgAddressStore},
    auth::{CredentialHasher, TokenIssuer},
    config::AppConfig,
    users::{PgUserStore, UserService},
};

/// Shared, read-only handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub addresses: AddressService,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> anyhow::Result<Self> {
        let issuer = Arc::new(TokenIssuer::from_config(config.jwt.clone()));
        let hasher = CredentialHasher::new().context("build credential hasher")?;
        Ok(Self::from_parts(
            UserService::new(Arc::new(PgUserStore::new(db.clone())), hasher, issuer),
            AddressService::new(Arc::new(PgAddressStore::new(db))),
        ))
    }

    pub fn from_parts(users: UserService, addresses: AddressService) -> Self {
        Self { users, addresses }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{
            addresses::repo::memory::MemoryAddressStore, users::repo::memory::MemoryUserStore,
        };

        let issuer = Arc::new(TokenIssuer::new(b"test", "test-issuer", "test-aud"));
        Self::from_parts(
            UserService::new(
                Arc::new(MemoryUserStore::default()),
                CredentialHasher::fast(),
                issuer,
            ),
            AddressService::new(Arc::new(MemoryAddressStore::default())),
        )
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for AddressService {
    fn from_ref(state: &AppState) -> Self {
        state.addresses.clone()
    }
}
