use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod credits;
pub mod doc;
pub mod health;
pub mod menu;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/menu", menu::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/credits", credits::router())
}
