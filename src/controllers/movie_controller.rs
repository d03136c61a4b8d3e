use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::movie_model::{
    BulkCreateMovies, BulkRemoveMovies, CreateMovie, InTheatresFilter, MovieResponse, MovieUpdate,
    MoviesResponse, MoviesWithSessionsResponse,
};
use crate::models::user_model::Role;
use crate::models::MessageResponse;
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn add_movie(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateMovie>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    user.require(Role::Manager)?;
    let movie = state.catalog.create_movie(payload).await?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

pub async fn add_movies(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<BulkCreateMovies>,
) -> Result<(StatusCode, Json<MoviesResponse>), AppError> {
    user.require(Role::Manager)?;
    let movies = state.catalog.bulk_create_movies(payload.movies).await?;
    Ok((StatusCode::CREATED, Json(movies.into())))
}

pub async fn load_movies(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MoviesResponse>, AppError> {
    user.require(Role::Manager)?;
    Ok(Json(state.catalog.list_movies().await?.into()))
}

pub async fn load_movies_in_theatres(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<InTheatresFilter>,
) -> Result<Json<MoviesWithSessionsResponse>, AppError> {
    let movies = state.catalog.find_movies_in_theatres(filter).await?;
    Ok(Json(MoviesWithSessionsResponse { movies }))
}

pub async fn load_movie(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<MovieResponse>, AppError> {
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.catalog.find_movie(id).await?.into()))
}

pub async fn update_movie(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
    ValidJson(payload): ValidJson<MovieUpdate>,
) -> Result<Json<MovieResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.catalog.update_movie(id, payload).await?.into()))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    state.catalog.remove_movie(id).await?;
    Ok(Json(MessageResponse::deleted("Movie", &id)))
}

pub async fn delete_movies(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<BulkRemoveMovies>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Manager)?;
    let ids = payload
        .ids
        .iter()
        .map(String::as_str)
        .map(parse_object_id)
        .collect::<Result<Vec<_>, _>>()?;
    let count = ids.len();
    state.catalog.bulk_remove_movies(ids).await?;
    Ok(Json(MessageResponse::new(format!("{count} movies deleted successfully"))))
}
