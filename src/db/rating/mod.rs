pub mod delete;
pub mod post;

pub use delete::delete_rating;
pub use post::create_rating;
