use crate::{
    db::movie::get::get_movie_ratings,
    errors::AppError,
    models::{Movie, MovieSnapshot},
    signals,
    state::AppState,
};

pub async fn update_movie(
    movie_id: i64,
    name: String,
    description: String,
    duration: i32,
    image: String,
    state: &AppState,
) -> Result<MovieSnapshot, AppError> {
    if duration <= 0 {
        return Err(AppError::BadRequest(
            "Duration must be a positive number of minutes".into(),
        ));
    }

    let movie = sqlx::query_as::<_, Movie>(
        "UPDATE movies SET name = $2, description = $3, duration = $4, image = $5
        WHERE id = $1
        RETURNING id, name, description, duration, image, created_at",
    )
    .bind(movie_id)
    .bind(&name)
    .bind(&description)
    .bind(duration)
    .bind(&image)
    .fetch_optional(&state.postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to update movie: {}", e)))?
    .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    let ratings = get_movie_ratings(movie_id, state.postgres.clone()).await?;
    let snapshot = MovieSnapshot::build(movie, ratings);

    tracing::info!("Updated movie '{}' (ID: {})", snapshot.name, snapshot.id);
    signals::movie_saved(snapshot.clone(), false, &state.channel).await;

    Ok(snapshot)
}

/// Re-saves a movie without changing any of its fields, so the saved
/// hook runs with a refreshed snapshot. Used by the rating-change path.
/// A movie deleted in a race matches zero rows, which is a no-op here,
/// not an error.
pub async fn touch_movie(movie_id: i64, state: &AppState) -> Result<(), AppError> {
    let touched = sqlx::query_as::<_, Movie>(
        "UPDATE movies SET name = name
        WHERE id = $1
        RETURNING id, name, description, duration, image, created_at",
    )
    .bind(movie_id)
    .fetch_optional(&state.postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to touch movie: {}", e)))?;

    let Some(movie) = touched else {
        tracing::debug!("Movie {} gone before rating-triggered save, skipping", movie_id);
        return Ok(());
    };

    let ratings = get_movie_ratings(movie_id, state.postgres.clone()).await?;
    let snapshot = MovieSnapshot::build(movie, ratings);

    signals::movie_saved(snapshot, false, &state.channel).await;
    Ok(())
}
