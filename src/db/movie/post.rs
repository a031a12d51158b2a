use crate::{errors::AppError, models::{Movie, MovieSnapshot}, signals, state::AppState};

pub async fn create_movie(
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
        "INSERT INTO movies (name, description, duration, image)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, description, duration, image, created_at",
    )
    .bind(&name)
    .bind(&description)
    .bind(duration)
    .bind(&image)
    .fetch_one(&state.postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create movie: {}", e)))?;

    tracing::info!("Created movie '{}' (ID: {})", movie.name, movie.id);

    let snapshot = MovieSnapshot::build(movie, Vec::new());
    signals::movie_saved(snapshot.clone(), true, &state.channel).await;

    Ok(snapshot)
}
