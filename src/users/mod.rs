use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod repo;
mod repo_types;
pub mod scope;
pub mod validation;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
