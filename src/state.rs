use sqlx::PgPool;
use std::sync::Arc;

use crate::{broadcast::ChannelLayer, signals::RatingSaveGuard};

#[derive(Clone)]
pub struct AppState {
    pub postgres: PgPool,
    pub channel: Arc<dyn ChannelLayer>,
    pub rating_guard: RatingSaveGuard,
}
