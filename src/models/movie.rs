use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Minutes, always positive.
    pub duration: i32,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub movie: i64,
    pub rating: i32,
}

/// Full representation of a movie as sent to clients, including the
/// derived average. Built fresh on every read, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSnapshot {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration: i32,
    pub image: String,
    pub average_rating: f64,
    pub ratings: Vec<Rating>,
}

impl MovieSnapshot {
    pub fn build(movie: Movie, ratings: Vec<Rating>) -> Self {
        Self {
            id: movie.id,
            name: movie.name,
            description: movie.description,
            duration: movie.duration,
            image: movie.image,
            average_rating: average_rating(&ratings),
            ratings,
        }
    }
}

/// Mean of the rating values, or 0 for a movie with no ratings.
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| r.rating as i64).sum();
    sum as f64 / ratings.len() as f64
}
