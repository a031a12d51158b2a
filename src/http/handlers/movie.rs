use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    db::{
        movie::{create_movie, delete_movie, get_all_movies, get_movie_row, get_movie_snapshot, update_movie},
        rating::{create_rating, delete_rating},
    },
    errors::{AppError, ErrorResponse},
    models::MovieSnapshot,
    state::AppState,
};

#[derive(Deserialize)]
pub struct MoviePayload {
    pub name: String,
    pub description: String,
    pub duration: i32,
    pub image: String,
}

#[derive(Deserialize)]
pub struct AddRatingPayload {
    /// Left untyped so a missing field, a non-integer and an
    /// out-of-range value each get their own error message.
    pub rating: Option<Value>,
}

pub async fn list_movies_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<MovieSnapshot>>, (StatusCode, Json<ErrorResponse>)> {
    let movies = get_all_movies(state.postgres.clone()).await.map_err(|e| {
        tracing::error!("Error listing movies: {}", e);
        e.to_response()
    })?;

    tracing::info!("Retrieved {} movies", movies.len());
    Ok(Json(movies))
}

pub async fn get_movie_handler(
    Path(movie_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MovieSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let movie = get_movie_snapshot(movie_id, state.postgres.clone())
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving movie {}: {}", movie_id, e);
            e.to_response()
        })?;

    Ok(Json(movie))
}

pub async fn create_movie_handler(
    State(state): State<AppState>,
    Json(payload): Json<MoviePayload>,
) -> Result<Json<MovieSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let movie = create_movie(
        payload.name,
        payload.description,
        payload.duration,
        payload.image,
        &state,
    )
    .await
    .map_err(|e| {
        tracing::error!("Error creating movie: {}", e);
        e.to_response()
    })?;

    Ok(Json(movie))
}

pub async fn update_movie_handler(
    Path(movie_id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<MoviePayload>,
) -> Result<Json<MovieSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let movie = update_movie(
        movie_id,
        payload.name,
        payload.description,
        payload.duration,
        payload.image,
        &state,
    )
    .await
    .map_err(|e| {
        tracing::error!("Error updating movie {}: {}", movie_id, e);
        e.to_response()
    })?;

    Ok(Json(movie))
}

pub async fn delete_movie_handler(
    Path(movie_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<&'static str>, (StatusCode, Json<ErrorResponse>)> {
    delete_movie(movie_id, &state).await.map_err(|e| {
        tracing::error!("Error deleting movie {}: {}", movie_id, e);
        e.to_response()
    })?;

    Ok(Json("success"))
}

/// `POST /movies/{id}/add_rating`. Validation order: the movie must
/// exist, then the value must be present, an integer, and in 1..=5.
/// Nothing is persisted unless all four checks pass. Returns the
/// refreshed movie snapshot, not the new rating.
pub async fn add_rating_handler(
    Path(movie_id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<AddRatingPayload>,
) -> Result<Json<MovieSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let movie = get_movie_row(movie_id, state.postgres.clone())
        .await
        .map_err(|e| {
            tracing::error!("Error looking up movie {}: {}", movie_id, e);
            e.to_response()
        })?;

    if movie.is_none() {
        return Err(AppError::NotFound(format!("Movie {} not found", movie_id)).to_response());
    }

    let value = parse_rating(payload.rating.as_ref()).map_err(|e| {
        tracing::warn!("Rejected rating for movie {}: {}", movie_id, e);
        e.to_response()
    })?;

    create_rating(movie_id, value, &state).await.map_err(|e| {
        tracing::error!("Error adding rating to movie {}: {}", movie_id, e);
        e.to_response()
    })?;

    let snapshot = get_movie_snapshot(movie_id, state.postgres.clone())
        .await
        .map_err(|e| {
            tracing::error!("Error refreshing movie {}: {}", movie_id, e);
            e.to_response()
        })?;

    Ok(Json(snapshot))
}

pub async fn delete_rating_handler(
    Path((movie_id, rating_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<Json<MovieSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    delete_rating(movie_id, rating_id, &state).await.map_err(|e| {
        tracing::error!("Error deleting rating {}: {}", rating_id, e);
        e.to_response()
    })?;

    let snapshot = get_movie_snapshot(movie_id, state.postgres.clone())
        .await
        .map_err(|e| {
            tracing::error!("Error refreshing movie {}: {}", movie_id, e);
            e.to_response()
        })?;

    Ok(Json(snapshot))
}

/// Accepts an integral JSON number or an integer string, the two
/// shapes clients actually send for `{"rating": ...}`.
fn parse_rating(value: Option<&Value>) -> Result<i32, AppError> {
    let value = match value {
        None | Some(Value::Null) => {
            return Err(AppError::BadRequest("Rating is required".into()));
        }
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::BadRequest("Rating must be an integer".into()))?;

    if !(1..=5).contains(&parsed) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".into(),
        ));
    }

    Ok(parsed as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn err_message(result: Result<i32, AppError>) -> String {
        match result.unwrap_err() {
            AppError::BadRequest(msg) => msg,
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn accepts_every_value_in_range() {
        for v in 1..=5 {
            assert_eq!(parse_rating(Some(&json!(v))).unwrap(), v);
        }
    }

    #[test]
    fn accepts_integer_strings() {
        assert_eq!(parse_rating(Some(&json!("4"))).unwrap(), 4);
        assert_eq!(parse_rating(Some(&json!(" 3 "))).unwrap(), 3);
    }

    #[test]
    fn missing_rating_is_required_error() {
        assert_eq!(err_message(parse_rating(None)), "Rating is required");
    }

    #[test]
    fn non_integer_input_is_rejected() {
        assert_eq!(
            err_message(parse_rating(Some(&json!(3.5)))),
            "Rating must be an integer"
        );
        assert_eq!(
            err_message(parse_rating(Some(&json!("four")))),
            "Rating must be an integer"
        );
        assert_eq!(
            err_message(parse_rating(Some(&json!([4])))),
            "Rating must be an integer"
        );
    }

    #[test]
    fn explicit_null_counts_as_missing() {
        assert_eq!(
            err_message(parse_rating(Some(&Value::Null))),
            "Rating is required"
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        for v in [0, 6, -1, 100] {
            assert_eq!(
                err_message(parse_rating(Some(&json!(v)))),
                "Rating must be between 1 and 5"
            );
        }
    }
}
