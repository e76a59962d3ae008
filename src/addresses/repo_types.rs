use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::services::spatial_point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Caller-supplied part of an address; everything else is derived.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub raw_address: String,
    pub coordinates: Coordinates,
    pub accuracy: String,
    pub source: String,
}

/// Fully derived record, ready to be written.
#[derive(Debug, Clone)]
pub struct AddressDraft {
    pub raw_address: String,
    pub normalized_address: String,
    pub coordinates: Coordinates,
    pub accuracy: String,
    pub source: String,
    pub geom: String,
}

#[derive(Debug, FromRow)]
pub struct AddressRow {
    pub id: Uuid,
    pub raw_address: String,
    pub normalized_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: String,
    pub source: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub id: Uuid,
    pub raw_address: String,
    pub normalized_address: String,
    pub coordinates: Coordinates,
    pub accuracy: String,
    pub source: String,
    pub geom: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        let coordinates = Coordinates {
            latitude: r.latitude,
            longitude: r.longitude,
        };
        Self {
            id: r.id,
            raw_address: r.raw_address,
            normalized_address: r.normalized_address,
            coordinates,
            accuracy: r.accuracy,
            source: r.source,
            geom: spatial_point(coordinates),
            created_at: r.created_at,
        }
    }
}

/// One page of addresses, newest first.
#[derive(Debug, Clone)]
pub struct AddressPage {
    pub items: Vec<Address>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl AddressPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}
