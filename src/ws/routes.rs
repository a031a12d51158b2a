use axum::{Router, routing::get};

use crate::{state::AppState, ws::handlers::movies_ws_handler};

pub fn create_ws_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws/movies", get(movies_ws_handler))
        .with_state(state)
}
