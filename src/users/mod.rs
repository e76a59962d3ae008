pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub use repo::{PgUserStore, UserStore};
pub use repo_types::{User, UserPatch};
pub use services::UserService;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
