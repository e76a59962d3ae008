pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub use repo::{AddressStore, PgAddressStore};
pub use repo_types::{Address, AddressInput, AddressPage, Coordinates};
pub use services::AddressService;

pub fn router() -> Router<AppState> {
    handlers::address_routes()
}
