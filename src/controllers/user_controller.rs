use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::models::user_model::{
    ChangePassword, CreateUser, ProfileUpdate, Role, SignIn, SignInResponse, SignUp, UserResponse,
    UsersResponse,
};
use crate::models::MessageResponse;
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignUp>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.identity.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn add_user(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    user.require(Role::Manager)?;
    let created = state.identity.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignIn>,
) -> Result<Json<SignInResponse>, AppError> {
    Ok(Json(state.identity.sign_in(payload).await?))
}

pub async fn load_my_profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.identity.find_user(principal.id).await?.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ValidJson(payload): ValidJson<ProfileUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.identity.update_profile(principal.id, payload).await?;
    Ok(Json(user.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ValidJson(payload): ValidJson<ChangePassword>,
) -> Result<Json<MessageResponse>, AppError> {
    state.identity.change_password(&principal, payload).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

pub async fn load_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UsersResponse>, AppError> {
    user.require(Role::Manager)?;
    Ok(Json(state.identity.list_users().await?.into()))
}

pub async fn load_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.identity.find_user(id).await?.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Manager)?;
    let id = parse_object_id(&id_str)?;
    state.identity.remove_user(id).await?;
    Ok(Json(MessageResponse::deleted("User", &id)))
}
