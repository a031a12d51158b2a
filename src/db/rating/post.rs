use crate::{errors::AppError, models::Rating, signals, state::AppState};

/// Inserts a rating for an existing movie. The value is validated at
/// the API boundary before this runs; the CHECK constraint is the last
/// line of defense. The saved hook then re-saves the owning movie so
/// subscribers get one `update` event with the new average.
pub async fn create_rating(
    movie_id: i64,
    value: i32,
    state: &AppState,
) -> Result<Rating, AppError> {
    let rating = sqlx::query_as::<_, Rating>(
        "INSERT INTO ratings (movie, rating) VALUES ($1, $2) RETURNING id, movie, rating",
    )
    .bind(movie_id)
    .bind(value)
    .fetch_one(&state.postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create rating: {}", e)))?;

    tracing::info!("Added rating {} to movie {}", value, movie_id);
    signals::rating_changed(movie_id, state).await?;

    Ok(rating)
}
