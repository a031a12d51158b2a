use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use futures::StreamExt;
use std::{collections::HashMap, time::Duration};
use tokio::sync::{Mutex, broadcast};

use crate::errors::AppError;

pub type RedisClient = Pool<RedisConnectionManager>;

/// Capacity of the per-topic fan-out buffer. A subscriber that lags
/// behind this far starts losing messages (delivery is best-effort).
const TOPIC_BUFFER: usize = 64;

/// Named-topic publish/subscribe bus decoupling mutation hooks from
/// connected clients. `publish` returns once the payload is handed to
/// the backend, not once it is delivered. Subscribing is taking a
/// receiver; unsubscribing is dropping it, so both are idempotent.
#[async_trait]
pub trait ChannelLayer: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AppError>;

    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String>;
}

/// Redis-backed channel layer. PUBLISH goes out through the shared
/// connection pool; one background task per topic SUBSCRIBEs on a
/// dedicated connection and forwards incoming payloads into the local
/// topic sender. Publisher and subscriber may live in different
/// processes as long as they share the redis backend.
pub struct RedisChannelLayer {
    redis: RedisClient,
    client: redis::Client,
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl RedisChannelLayer {
    pub fn new(redis: RedisClient, client: redis::Client) -> Self {
        Self {
            redis,
            client,
            topics: Mutex::new(HashMap::new()),
        }
    }

    async fn topic_sender(&self, topic: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.lock().await;
        if let Some(sender) = topics.get(topic) {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(TOPIC_BUFFER);
        topics.insert(topic.to_string(), sender.clone());
        self.spawn_listener(topic.to_string(), sender.clone());
        sender
    }

    fn spawn_listener(&self, topic: String, sender: broadcast::Sender<String>) {
        let client = self.client.clone();

        tokio::spawn(async move {
            loop {
                match client.get_async_pubsub().await {
                    Ok(mut pubsub) => {
                        if let Err(e) = pubsub.subscribe(&topic).await {
                            tracing::warn!("Failed to subscribe to '{}': {}", topic, e);
                        } else {
                            tracing::info!("Listening on redis channel '{}'", topic);
                            let mut stream = pubsub.on_message();
                            while let Some(msg) = stream.next().await {
                                match msg.get_payload::<String>() {
                                    // send only fails when no receiver is
                                    // subscribed, which is fine
                                    Ok(payload) => {
                                        let _ = sender.send(payload);
                                    }
                                    Err(e) => {
                                        tracing::warn!(
                                            "Dropping malformed payload on '{}': {}",
                                            topic,
                                            e
                                        );
                                    }
                                }
                            }
                            tracing::warn!("Redis pub/sub stream for '{}' ended", topic);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to open pub/sub connection: {}", e);
                    }
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }
}

#[async_trait]
impl ChannelLayer for RedisChannelLayer {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AppError> {
        let mut conn = self.redis.get().await.map_err(|e| match e {
            bb8::RunError::User(err) => AppError::RedisCommandError(err),
            bb8::RunError::TimedOut => {
                AppError::RedisPoolError("Redis connection timed out".into())
            }
        })?;

        let _: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(&payload)
            .query_async(&mut *conn)
            .await
            .map_err(AppError::RedisCommandError)?;

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        self.topic_sender(topic).await.subscribe()
    }
}

/// In-memory channel layer for tests and single-process runs. Publishes
/// straight into the local topic sender and records every published
/// payload so tests can assert on what went out.
#[derive(Default)]
pub struct MemoryChannelLayer {
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
    published: std::sync::Mutex<Vec<(String, String)>>,
}

impl MemoryChannelLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(topic, payload)` published so far, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    async fn topic_sender(&self, topic: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_BUFFER).0)
            .clone()
    }
}

#[async_trait]
impl ChannelLayer for MemoryChannelLayer {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AppError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.clone()));

        let _ = self.topic_sender(topic).await.send(payload);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> broadcast::Receiver<String> {
        self.topic_sender(topic).await.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_current_subscribers_only() {
        let layer = MemoryChannelLayer::new();

        let mut early = layer.subscribe("movies").await;
        layer.publish("movies", "first".into()).await.unwrap();

        // Subscribed after the publish: no replay.
        let mut late = layer.subscribe("movies").await;
        layer.publish("movies", "second".into()).await.unwrap();

        assert_eq!(early.recv().await.unwrap(), "first");
        assert_eq!(early.recv().await.unwrap(), "second");
        assert_eq!(late.recv().await.unwrap(), "second");
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let layer = MemoryChannelLayer::new();

        let mut movies = layer.subscribe("movies").await;
        layer.publish("other", "noise".into()).await.unwrap();
        layer.publish("movies", "signal".into()).await.unwrap();

        assert_eq!(movies.recv().await.unwrap(), "signal");
    }

    #[tokio::test]
    async fn dropping_a_receiver_unsubscribes_it() {
        let layer = MemoryChannelLayer::new();

        let first = layer.subscribe("movies").await;
        let mut second = layer.subscribe("movies").await;
        drop(first);

        layer.publish("movies", "after-drop".into()).await.unwrap();
        assert_eq!(second.recv().await.unwrap(), "after-drop");
    }

    #[tokio::test]
    async fn published_payloads_are_recorded_in_order() {
        let layer = MemoryChannelLayer::new();

        layer.publish("movies", "a".into()).await.unwrap();
        layer.publish("movies", "b".into()).await.unwrap();

        let published = layer.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], ("movies".to_string(), "a".to_string()));
        assert_eq!(published[1], ("movies".to_string(), "b".to_string()));
    }
}
