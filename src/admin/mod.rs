use crate::state::AppState;
use axum::Router;

pub mod dashboard;
pub mod handlers;
pub mod layout;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
