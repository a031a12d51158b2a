use sqlx::PgPool;

use crate::{
    errors::AppError,
    models::{Movie, MovieSnapshot, Rating},
};

const MOVIE_COLUMNS: &str = "id, name, description, duration, image, created_at";

pub async fn get_movie_row(movie_id: i64, postgres: PgPool) -> Result<Option<Movie>, AppError> {
    sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
    ))
    .bind(movie_id)
    .fetch_optional(&postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to fetch movie: {}", e)))
}

pub async fn get_movie_ratings(movie_id: i64, postgres: PgPool) -> Result<Vec<Rating>, AppError> {
    sqlx::query_as::<_, Rating>("SELECT id, movie, rating FROM ratings WHERE movie = $1 ORDER BY id")
        .bind(movie_id)
        .fetch_all(&postgres)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch ratings: {}", e)))
}

/// Current representation of a movie, average included. Recomputed from
/// the rating rows on every call.
pub async fn get_movie_snapshot(movie_id: i64, postgres: PgPool) -> Result<MovieSnapshot, AppError> {
    let movie = get_movie_row(movie_id, postgres.clone())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    let ratings = get_movie_ratings(movie_id, postgres).await?;
    Ok(MovieSnapshot::build(movie, ratings))
}

pub async fn get_all_movies(postgres: PgPool) -> Result<Vec<MovieSnapshot>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY id"
    ))
    .fetch_all(&postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to fetch movies: {}", e)))?;

    let mut snapshots = Vec::with_capacity(movies.len());
    for movie in movies {
        let ratings = get_movie_ratings(movie.id, postgres.clone()).await?;
        snapshots.push(MovieSnapshot::build(movie, ratings));
    }

    Ok(snapshots)
}
