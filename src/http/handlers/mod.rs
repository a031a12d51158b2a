mod movie;

pub use movie::{
    add_rating_handler, create_movie_handler, delete_movie_handler, delete_rating_handler,
    get_movie_handler, list_movies_handler, update_movie_handler,
};
