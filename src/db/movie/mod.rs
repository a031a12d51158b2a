pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub use delete::delete_movie;
pub use get::{get_all_movies, get_movie_row, get_movie_snapshot};
pub use post::create_movie;
pub use put::{touch_movie, update_movie};
