use crate::{errors::AppError, signals, state::AppState};

/// Deletes a movie; the schema cascade removes its ratings in the same
/// statement. Exactly one delete event goes out, nothing for the
/// cascaded ratings.
pub async fn delete_movie(movie_id: i64, state: &AppState) -> Result<(), AppError> {
    let deleted = sqlx::query_as::<_, (i64,)>("DELETE FROM movies WHERE id = $1 RETURNING id")
        .bind(movie_id)
        .fetch_optional(&state.postgres)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to delete movie: {}", e)))?;

    if deleted.is_none() {
        return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
    }

    tracing::info!("Deleted movie {}", movie_id);
    signals::movie_deleted(movie_id, &state.channel).await;

    Ok(())
}
