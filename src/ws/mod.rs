mod handlers;
mod routes;

pub use routes::create_ws_routes;
