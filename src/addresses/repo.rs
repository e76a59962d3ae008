use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Address, AddressDraft, AddressRow};
use crate::db::StoreResult;

/// Persistence the address service needs.
///
/// Writes must surface a duplicate normalized address as
/// [`StoreError::UniqueViolation`](crate::db::StoreError::UniqueViolation).
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Address>>;
    async fn find_by_normalized(&self, normalized: &str) -> StoreResult<Option<Address>>;
    async fn insert(&self, id: Uuid, draft: &AddressDraft) -> StoreResult<Address>;
    /// Returns `None` when no row has `id`; never inserts.
    async fn update(&self, id: Uuid, draft: &AddressDraft) -> StoreResult<Option<Address>>;
    /// Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<i64>;
    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<Address>>;
}

#[derive(Clone)]
pub struct PgAddressStore {
    db: PgPool,
}

impl PgAddressStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            SELECT id, raw_address, normalized_address, latitude, longitude,
                   accuracy, source, created_at
            FROM addresses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Address::from))
    }

    async fn find_by_normalized(&self, normalized: &str) -> StoreResult<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            SELECT id, raw_address, normalized_address, latitude, longitude,
                   accuracy, source, created_at
            FROM addresses
            WHERE normalized_address = $1
            "#,
        )
        .bind(normalized)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Address::from))
    }

    async fn insert(&self, id: Uuid, draft: &AddressDraft) -> StoreResult<Address> {
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            INSERT INTO addresses
                (id, raw_address, normalized_address, latitude, longitude, accuracy, source, geom)
            VALUES ($1, $2, $3, $4, $5, $6, $7, ST_GeogFromText($8))
            RETURNING id, raw_address, normalized_address, latitude, longitude,
                      accuracy, source, created_at
            "#,
        )
        .bind(id)
        .bind(&draft.raw_address)
        .bind(&draft.normalized_address)
        .bind(draft.coordinates.latitude)
        .bind(draft.coordinates.longitude)
        .bind(&draft.accuracy)
        .bind(&draft.source)
        .bind(&draft.geom)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, draft: &AddressDraft) -> StoreResult<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(
            r#"
            UPDATE addresses
               SET raw_address = $2,
                   normalized_address = $3,
                   latitude = $4,
                   longitude = $5,
                   accuracy = $6,
                   source = $7,
                   geom = ST_GeogFromText($8)
             WHERE id = $1
            RETURNING id, raw_address, normalized_address, latitude, longitude,
                      accuracy, source, created_at
            "#,
        )
        .bind(id)
        .bind(&draft.raw_address)
        .bind(&draft.normalized_address)
        .bind(draft.coordinates.latitude)
        .bind(draft.coordinates.longitude)
        .bind(&draft.accuracy)
        .bind(&draft.source)
        .bind(&draft.geom)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Address::from))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM addresses")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<Address>> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r#"
            SELECT id, raw_address, normalized_address, latitude, longitude,
                   accuracy, source, created_at
            FROM addresses
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }
}
