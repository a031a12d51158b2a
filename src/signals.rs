//! Post-mutation hooks. The db layer calls these right after a
//! successful write; they build the change event and hand it to the
//! channel layer. Broadcasting is best-effort: a failed publish is
//! logged and never fails the mutation that triggered it.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use crate::{
    broadcast::ChannelLayer,
    db,
    errors::AppError,
    models::{MovieEvent, MovieSnapshot, event::MOVIES_TOPIC},
    state::AppState,
};

/// Fired after a movie row is inserted or updated.
pub async fn movie_saved(snapshot: MovieSnapshot, created: bool, channel: &Arc<dyn ChannelLayer>) {
    publish(MovieEvent::saved(snapshot, created), channel).await;
}

/// Fired after a movie row is deleted. The cascade already removed its
/// ratings; clients only need the id.
pub async fn movie_deleted(movie_id: i64, channel: &Arc<dyn ChannelLayer>) {
    publish(MovieEvent::Delete { movie_id }, channel).await;
}

/// Fired after a rating is inserted or deleted. Re-saves the owning
/// movie so the movie path emits exactly one `update` event with the
/// refreshed average. The guard is checked first: when this movie is
/// already being re-saved from a rating change, a nested invocation
/// must not emit a second event.
pub async fn rating_changed(movie_id: i64, state: &AppState) -> Result<(), AppError> {
    // Concurrent submissions to the same movie take turns, so each one
    // still emits its own update with the averages it produced. Only a
    // nested invocation from the triggered save itself is skipped.
    let save_lock = state.rating_guard.save_lock(movie_id);
    let _serialized = save_lock.lock().await;

    let Some(_token) = state.rating_guard.try_acquire(movie_id) else {
        tracing::debug!(
            "Movie {} already saving from a rating change, skipping",
            movie_id
        );
        return Ok(());
    };

    // Token releases the marker on drop, error paths included.
    db::movie::touch_movie(movie_id, state).await
}

async fn publish(event: MovieEvent, channel: &Arc<dyn ChannelLayer>) {
    let payload = match serde_json::to_string(&event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to serialize movie event: {}", e);
            return;
        }
    };

    if let Err(e) = channel.publish(MOVIES_TOPIC, payload).await {
        tracing::warn!("Failed to broadcast movie event: {}", e);
    }
}

/// Set of movie ids currently being re-saved because one of their
/// ratings changed. Prevents the rating-triggered save from being
/// re-entered for the same movie. In-memory only, never persisted.
#[derive(Clone, Default)]
pub struct RatingSaveGuard {
    in_flight: Arc<Mutex<HashSet<i64>>>,
    save_locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl RatingSaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-movie lock serializing rating-triggered saves. One tiny
    /// entry per rated movie, reused across mutations.
    fn save_lock(&self, movie_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.save_locks
            .lock()
            .unwrap()
            .entry(movie_id)
            .or_default()
            .clone()
    }

    /// Marks `movie_id` as saving-from-a-rating-change. Returns `None`
    /// when the marker is already set, in which case the caller must
    /// skip the triggered save.
    pub fn try_acquire(&self, movie_id: i64) -> Option<RatingSaveToken> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(movie_id) {
            return None;
        }
        Some(RatingSaveToken {
            movie_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_held(&self, movie_id: i64) -> bool {
        self.in_flight.lock().unwrap().contains(&movie_id)
    }
}

/// Clears the marker on drop, so an error in the triggered save can
/// never leave a movie permanently wedged.
pub struct RatingSaveToken {
    movie_id: i64,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl Drop for RatingSaveToken {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap().remove(&self.movie_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_marks_and_release_clears() {
        let guard = RatingSaveGuard::new();

        let token = guard.try_acquire(1).expect("first acquire succeeds");
        assert!(guard.is_held(1));

        drop(token);
        assert!(!guard.is_held(1));
    }

    #[test]
    fn reentry_is_refused_while_held() {
        let guard = RatingSaveGuard::new();

        let _token = guard.try_acquire(1).unwrap();
        assert!(guard.try_acquire(1).is_none());

        // A different movie is unaffected.
        assert!(guard.try_acquire(2).is_some());
    }

    #[test]
    fn marker_clears_even_when_the_save_errors() {
        let guard = RatingSaveGuard::new();

        fn failing_save(guard: &RatingSaveGuard) -> Result<(), AppError> {
            let _token = guard.try_acquire(1).unwrap();
            Err(AppError::DatabaseError("connection reset".into()))
        }

        assert!(failing_save(&guard).is_err());
        assert!(!guard.is_held(1));
        assert!(guard.try_acquire(1).is_some());
    }

    #[test]
    fn guard_is_shared_across_clones() {
        let guard = RatingSaveGuard::new();
        let clone = guard.clone();

        let _token = guard.try_acquire(5).unwrap();
        assert!(clone.is_held(5));
        assert!(clone.try_acquire(5).is_none());
    }
}
