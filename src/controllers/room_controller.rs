use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::models::room_model::{CreateRoom, RoomResponse, RoomUpdate, RoomsResponse};
use crate::models::user_model::Role;
use crate::models::MessageResponse;
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn add_room(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateRoom>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    user.require(Role::Manager)?;
    let room = state.catalog.create_room(payload).await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

pub async fn load_rooms(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<RoomsResponse>, AppError> {
    user.require(Role::Manager)?;
    Ok(Json(state.catalog.list_rooms().await?.into()))
}

pub async fn load_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.catalog.find_room(id).await?.into()))
}

pub async fn update_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
    ValidJson(payload): ValidJson<RoomUpdate>,
) -> Result<Json<RoomResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.catalog.update_room(id, payload).await?.into()))
}

pub async fn delete_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    state.catalog.remove_room(id).await?;
    Ok(Json(MessageResponse::deleted("Room", &id)))
}
