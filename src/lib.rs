pub mod broadcast;
mod db;
pub mod errors;
mod http;
mod middleware;
pub mod models;
pub mod signals;
mod state;
mod ws;

use axum::Router;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use middleware::cors_layer;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::{
    broadcast::{ChannelLayer, RedisChannelLayer},
    signals::RatingSaveGuard,
};

pub async fn start_server() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let postgres = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to postgres");

    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
    let manager = RedisConnectionManager::new(redis_url.clone()).unwrap();
    let redis_pool = Pool::builder().build(manager).await.unwrap();
    let redis_client = redis::Client::open(redis_url).expect("Invalid REDIS_URL");

    if let Err(e) = db::init::initialize_schema(postgres.clone()).await {
        tracing::error!("Failed to initialize schema: {}", e);
        panic!("Failed to initialize schema: {}", e);
    }

    let channel: Arc<dyn ChannelLayer> = Arc::new(RedisChannelLayer::new(redis_pool, redis_client));
    let state = AppState {
        postgres,
        channel,
        rating_guard: RatingSaveGuard::new(),
    };

    let app = Router::new()
        .merge(http::create_http_routes(state.clone()))
        .merge(ws::create_ws_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .fallback(|| async { "404 Not Found" });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind address");

    tracing::info!("Movie site server running at http://0.0.0.0:{port}/movies");
    tracing::info!("Movie updates websocket running at ws://0.0.0.0:{port}/ws/movies");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
