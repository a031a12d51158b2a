use serde::{Deserialize, Serialize};

use crate::models::movie::MovieSnapshot;

/// Topic every movie change is published on and every WebSocket client
/// is subscribed to.
pub const MOVIES_TOPIC: &str = "movies";

/// Change notification broadcast to connected clients.
///
/// Serializes to the wire schema:
/// `{"action":"create"|"update","movie":{...}}` or
/// `{"action":"delete","movie_id":<id>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MovieEvent {
    Create { movie: MovieSnapshot },
    Update { movie: MovieSnapshot },
    Delete { movie_id: i64 },
}

impl MovieEvent {
    pub fn saved(movie: MovieSnapshot, created: bool) -> Self {
        if created {
            MovieEvent::Create { movie }
        } else {
            MovieEvent::Update { movie }
        }
    }
}
