use serde::{Deserialize, Serialize};

use super::repo_types::{Address, AddressInput, AddressPage, Coordinates};

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub raw_address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub accuracy: String,
    #[serde(default)]
    pub source: String,
}

impl From<CreateAddressRequest> for AddressInput {
    fn from(r: CreateAddressRequest) -> Self {
        Self {
            raw_address: r.raw_address,
            coordinates: r.coordinates,
            accuracy: r.accuracy,
            source: r.source,
        }
    }
}

/// Full replacement of an address; derived fields are recomputed.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub id: String,
    pub raw_address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub accuracy: String,
    #[serde(default)]
    pub source: String,
}

impl UpdateAddressRequest {
    pub fn into_parts(self) -> (String, AddressInput) {
        let input = AddressInput {
            raw_address: self.raw_address,
            coordinates: self.coordinates,
            accuracy: self.accuracy,
            source: self.source,
        };
        (self.id, input)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressIdRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAddressRequest {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct ListAddressResponse {
    pub addresses: Vec<Address>,
    pub total_records: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl From<AddressPage> for ListAddressResponse {
    fn from(p: AddressPage) -> Self {
        Self {
            total_pages: p.total_pages(),
            total_records: p.total,
            page: p.page,
            limit: p.limit,
            addresses: p.items,
        }
    }
}
