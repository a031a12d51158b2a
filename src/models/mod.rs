pub mod event;
pub mod movie;

pub use event::MovieEvent;
pub use movie::{Movie, MovieSnapshot, Rating, average_rating};
