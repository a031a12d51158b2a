use sqlx::PgPool;

use crate::errors::AppError;

/// Ensures the movies/ratings schema exists. Safe to run on every
/// startup. The rating range and the cascade from ratings to movies
/// are enforced here so no code path can create an orphan or an
/// out-of-range rating.
pub async fn initialize_schema(postgres: PgPool) -> Result<(), AppError> {
    tracing::info!("Ensuring database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS movies (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            duration INT NOT NULL CHECK (duration > 0),
            image TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(&postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create movies table: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ratings (
            id BIGSERIAL PRIMARY KEY,
            movie BIGINT NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            rating INT NOT NULL CHECK (rating BETWEEN 1 AND 5)
        )",
    )
    .execute(&postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create ratings table: {}", e)))?;

    Ok(())
}
