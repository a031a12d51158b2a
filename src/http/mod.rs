pub mod handlers;
mod routes;

pub use routes::create_http_routes;
