use std::sync::Arc;

use movie_site_be::broadcast::{ChannelLayer, MemoryChannelLayer};
use movie_site_be::models::{MovieEvent, MovieSnapshot, Rating, average_rating, event::MOVIES_TOPIC};
use movie_site_be::signals::RatingSaveGuard;

fn snapshot(id: i64, ratings: Vec<Rating>) -> MovieSnapshot {
    MovieSnapshot {
        id,
        name: "Test".into(),
        description: "d".into(),
        duration: 100,
        image: "http://x/y.png".into(),
        average_rating: average_rating(&ratings),
        ratings,
    }
}

fn rating(id: i64, movie: i64, value: i32) -> Rating {
    Rating {
        id,
        movie,
        rating: value,
    }
}

async fn publish_event(layer: &Arc<MemoryChannelLayer>, event: MovieEvent) {
    layer
        .publish(MOVIES_TOPIC, serde_json::to_string(&event).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn movie_lifecycle_reaches_a_subscriber_in_order() {
    let layer = Arc::new(MemoryChannelLayer::new());
    let mut subscriber = layer.subscribe(MOVIES_TOPIC).await;

    // Create with no ratings, rate 4, rate 2, then delete.
    publish_event(&layer, MovieEvent::saved(snapshot(1, vec![]), true)).await;
    publish_event(
        &layer,
        MovieEvent::saved(snapshot(1, vec![rating(1, 1, 4)]), false),
    )
    .await;
    publish_event(
        &layer,
        MovieEvent::saved(snapshot(1, vec![rating(1, 1, 4), rating(2, 1, 2)]), false),
    )
    .await;
    publish_event(&layer, MovieEvent::Delete { movie_id: 1 }).await;

    let first: serde_json::Value =
        serde_json::from_str(&subscriber.recv().await.unwrap()).unwrap();
    assert_eq!(first["action"], "create");
    assert_eq!(first["movie"]["average_rating"], 0.0);

    let second: serde_json::Value =
        serde_json::from_str(&subscriber.recv().await.unwrap()).unwrap();
    assert_eq!(second["action"], "update");
    assert_eq!(second["movie"]["average_rating"], 4.0);

    let third: serde_json::Value =
        serde_json::from_str(&subscriber.recv().await.unwrap()).unwrap();
    assert_eq!(third["action"], "update");
    assert_eq!(third["movie"]["average_rating"], 3.0);

    let fourth: serde_json::Value =
        serde_json::from_str(&subscriber.recv().await.unwrap()).unwrap();
    assert_eq!(fourth["action"], "delete");
    assert_eq!(fourth["movie_id"], 1);

    // And nothing after the delete.
    assert!(subscriber.try_recv().is_err());
}

#[tokio::test]
async fn adding_then_removing_a_rating_restores_the_average() {
    let layer = Arc::new(MemoryChannelLayer::new());

    let before = vec![rating(1, 1, 4)];
    let after = vec![rating(1, 1, 4), rating(2, 1, 2)];

    publish_event(&layer, MovieEvent::saved(snapshot(1, after), false)).await;
    publish_event(&layer, MovieEvent::saved(snapshot(1, before), false)).await;

    let published = layer.published();
    // One update per rating mutation, not zero, not two.
    assert_eq!(published.len(), 2);

    let last: serde_json::Value = serde_json::from_str(&published[1].1).unwrap();
    assert_eq!(last["movie"]["average_rating"], 4.0);
}

#[tokio::test]
async fn a_dropped_subscriber_does_not_break_the_publisher() {
    let layer = Arc::new(MemoryChannelLayer::new());

    let gone = layer.subscribe(MOVIES_TOPIC).await;
    let mut alive = layer.subscribe(MOVIES_TOPIC).await;
    drop(gone);

    publish_event(&layer, MovieEvent::Delete { movie_id: 9 }).await;

    assert_eq!(
        alive.recv().await.unwrap(),
        serde_json::to_string(&MovieEvent::Delete { movie_id: 9 }).unwrap()
    );
}

#[test]
fn guard_skips_nested_reentry_but_allows_sequential_saves() {
    let guard = RatingSaveGuard::new();

    // First rating mutation acquires the marker.
    let token = guard.try_acquire(1).expect("not held yet");

    // A nested save for the same movie must be skipped.
    assert!(guard.try_acquire(1).is_none());

    // After the triggered save completes the next mutation proceeds.
    drop(token);
    let token = guard.try_acquire(1).expect("released after save");
    drop(token);
}

#[test]
fn concurrent_submissions_to_different_movies_do_not_interfere() {
    let guard = RatingSaveGuard::new();

    let a = guard.try_acquire(1).unwrap();
    let b = guard.try_acquire(2).unwrap();

    assert!(guard.is_held(1));
    assert!(guard.is_held(2));

    drop(a);
    assert!(!guard.is_held(1));
    assert!(guard.is_held(2));
    drop(b);
}
