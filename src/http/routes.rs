use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    http::handlers::{
        add_rating_handler, create_movie_handler, delete_movie_handler, delete_rating_handler,
        get_movie_handler, list_movies_handler, update_movie_handler,
    },
    state::AppState,
};

pub fn create_http_routes(state: AppState) -> Router {
    Router::new()
        .route("/movies", get(list_movies_handler).post(create_movie_handler))
        .route(
            "/movies/{movie_id}",
            get(get_movie_handler)
                .put(update_movie_handler)
                .delete(delete_movie_handler),
        )
        .route("/movies/{movie_id}/add_rating", post(add_rating_handler))
        .route(
            "/movies/{movie_id}/ratings/{rating_id}",
            delete(delete_rating_handler),
        )
        .with_state(state)
}
