use crate::{errors::AppError, signals, state::AppState};

/// Removes a single rating. Scoped to the owning movie so a rating id
/// can only be deleted through the movie it belongs to. Triggers the
/// same movie re-save as an insert, emitting one `update` event.
pub async fn delete_rating(movie_id: i64, rating_id: i64, state: &AppState) -> Result<(), AppError> {
    let deleted =
        sqlx::query_as::<_, (i64,)>("DELETE FROM ratings WHERE id = $1 AND movie = $2 RETURNING id")
            .bind(rating_id)
            .bind(movie_id)
            .fetch_optional(&state.postgres)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete rating: {}", e)))?;

    if deleted.is_none() {
        return Err(AppError::NotFound(format!(
            "Rating {} not found for movie {}",
            rating_id, movie_id
        )));
    }

    tracing::info!("Deleted rating {} from movie {}", rating_id, movie_id);
    signals::rating_changed(movie_id, state).await?;

    Ok(())
}
