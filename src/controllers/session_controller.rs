use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::models::session_model::{
    CreateSession, SessionDateFilter, SessionResponse, SessionUpdate, SessionsResponse,
};
use crate::models::user_model::Role;
use crate::models::MessageResponse;
use crate::services::scheduler::SessionChanges;
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn add_session(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateSession>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    user.require(Role::Manager)?;
    let movie_id = parse_object_id(&payload.movie_id)?;
    let room_id = parse_object_id(&payload.room_id)?;
    let session = state
        .scheduler
        .create_session(payload.date, room_id, payload.time_slot, movie_id)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn load_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SessionsResponse>, AppError> {
    user.require(Role::Manager)?;
    Ok(Json(state.scheduler.list_sessions().await?.into()))
}

pub async fn load_session(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.scheduler.find_session(id).await?.into()))
}

pub async fn load_sessions_by_movie(
    State(state): State<AppState>,
    Path(movie_id_str): Path<String>,
    ValidQuery(filter): ValidQuery<SessionDateFilter>,
) -> Result<Json<SessionsResponse>, AppError> {
    let movie_id = parse_object_id(&movie_id_str)?;
    let sessions = state
        .scheduler
        .find_sessions_by_movie(movie_id, filter.date)
        .await?;
    Ok(Json(sessions.into()))
}

pub async fn update_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
    ValidJson(payload): ValidJson<SessionUpdate>,
) -> Result<Json<SessionResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    let changes = SessionChanges {
        date: payload.date,
        time_slot: payload.time_slot,
        movie_id: payload.movie_id.as_deref().map(parse_object_id).transpose()?,
        room_id: payload.room_id.as_deref().map(parse_object_id).transpose()?,
    };
    Ok(Json(state.scheduler.update_session(id, changes).await?.into()))
}

pub async fn delete_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    state.scheduler.remove_session(id).await?;
    Ok(Json(MessageResponse::deleted("Session", &id)))
}
