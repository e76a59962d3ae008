use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::repo::AddressStore;
use super::repo_types::{Address, AddressDraft, AddressInput, AddressPage, Coordinates};
use crate::{
    db::StoreError,
    error::{AppError, AppResult},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Spatial reference of every stored point (WGS 84).
pub const SRID: u32 = 4326;

/// Deduplication key: surrounding whitespace trimmed, then lowercased.
pub fn normalize_address(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// EWKT point, longitude first, six decimals.
pub fn spatial_point(c: Coordinates) -> String {
    format!("SRID={SRID};POINT({:.6} {:.6})", c.longitude, c.latitude)
}

fn validate_coordinates(c: Coordinates) -> AppResult<()> {
    if !c.latitude.is_finite() || !(-90.0..=90.0).contains(&c.latitude) {
        return Err(AppError::invalid(format!(
            "latitude must be within [-90, 90], got {}",
            c.latitude
        )));
    }
    if !c.longitude.is_finite() || !(-180.0..=180.0).contains(&c.longitude) {
        return Err(AppError::invalid(format!(
            "longitude must be within [-180, 180], got {}",
            c.longitude
        )));
    }
    Ok(())
}

/// Validates input and computes both derived fields.
pub fn derive(input: AddressInput) -> AppResult<AddressDraft> {
    let normalized_address = normalize_address(&input.raw_address);
    if normalized_address.is_empty() {
        return Err(AppError::invalid("raw_address is required"));
    }
    validate_coordinates(input.coordinates)?;
    Ok(AddressDraft {
        geom: spatial_point(input.coordinates),
        raw_address: input.raw_address,
        normalized_address,
        coordinates: input.coordinates,
        accuracy: input.accuracy,
        source: input.source,
    })
}

/// Page 0 and below become 1; a non-positive limit becomes the default and
/// anything above the maximum is capped.
pub fn clamp_page(page: i64, limit: i64) -> (i64, i64) {
    let page = page.max(1);
    let limit = if limit <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    };
    (page, limit)
}

pub fn parse_address_id(raw: &str) -> AppResult<Uuid> {
    if raw.is_empty() {
        return Err(AppError::invalid("address id is required"));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::invalid(format!("invalid address id: {raw}")))
}

fn duplicate(normalized: &str) -> AppError {
    AppError::Conflict(format!("address already exists: {normalized}"))
}

fn address_conflict(normalized: &str) -> impl Fn(StoreError) -> AppError + '_ {
    move |e| match e {
        StoreError::UniqueViolation => duplicate(normalized),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct AddressService {
    store: Arc<dyn AddressStore>,
}

impl AddressService {
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: AddressInput) -> AppResult<Address> {
        let draft = derive(input)?;

        if self
            .store
            .find_by_normalized(&draft.normalized_address)
            .await?
            .is_some()
        {
            warn!(normalized = %draft.normalized_address, "duplicate address");
            return Err(duplicate(&draft.normalized_address));
        }

        let addr = self
            .store
            .insert(Uuid::new_v4(), &draft)
            .await
            .map_err(address_conflict(&draft.normalized_address))?;
        info!(address_id = %addr.id, "address created");
        Ok(addr)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: AddressInput) -> AppResult<Address> {
        let id = parse_address_id(id)?;
        let draft = derive(input)?;

        if let Some(existing) = self
            .store
            .find_by_normalized(&draft.normalized_address)
            .await?
        {
            if existing.id != id {
                // Missing target is NotFound even when its key is taken.
                if self.store.find_by_id(id).await?.is_none() {
                    return Err(AppError::not_found("address", id));
                }
                warn!(normalized = %draft.normalized_address, "duplicate address");
                return Err(duplicate(&draft.normalized_address));
            }
        }

        let addr = self
            .store
            .update(id, &draft)
            .await
            .map_err(address_conflict(&draft.normalized_address))?
            .ok_or_else(|| AppError::not_found("address", id))?;
        info!(address_id = %addr.id, "address updated");
        Ok(addr)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> AppResult<Address> {
        let id = parse_address_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("address", id))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_address_id(id)?;
        if !self.store.delete(id).await? {
            return Err(AppError::not_found("address", id));
        }
        info!(address_id = %id, "address deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, limit: i64) -> AppResult<AddressPage> {
        let (page, limit) = clamp_page(page, limit);
        let total = self.store.count().await?;
        let offset = (page - 1).saturating_mul(limit);

        // Count first: an empty store or a page past the end never fetches.
        let items = if offset >= total {
            Vec::new()
        } else {
            self.store.list(limit, offset).await?
        };
        debug!(total, page, limit, returned = items.len(), "listed addresses");

        Ok(AddressPage {
            items,
            total,
            page,
            limit,
        })
    }
}
