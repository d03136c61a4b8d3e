use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::models::ticket_model::{
    CreateTicket, TicketResponse, TicketsResponse, WatchHistoryListResponse,
};
use crate::models::user_model::Role;
use crate::models::MessageResponse;
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn buy_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateTicket>,
) -> Result<(StatusCode, Json<TicketResponse>), AppError> {
    let buyer = user.require(Role::Customer)?;
    let session_id = parse_object_id(&payload.session_id)?;
    let ticket = state.ticketing.create_ticket(session_id, buyer).await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

pub async fn load_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TicketsResponse>, AppError> {
    user.require(Role::Manager)?;
    Ok(Json(state.ticketing.list_all_tickets().await?.into()))
}

pub async fn use_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<TicketResponse>, AppError> {
    let requester = user.require(Role::Customer)?;
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.ticketing.mark_used(id, requester).await?.into()))
}

pub async fn refund_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id_str): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(Role::Customer)?;
    let id = parse_object_id(&id_str)?;
    state.ticketing.refund(id).await?;
    Ok(Json(MessageResponse::new("Ticket refunded successfully").with_id(&id)))
}

pub async fn load_watch_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<WatchHistoryListResponse>, AppError> {
    let viewer = user.require(Role::Customer)?;
    Ok(Json(state.ticketing.list_watch_history(viewer).await?.into()))
}

pub async fn load_my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TicketsResponse>, AppError> {
    let owner = user.require(Role::Customer)?;
    Ok(Json(state.ticketing.list_user_tickets(owner).await?.into()))
}

pub async fn load_ticket(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<TicketResponse>, AppError> {
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.ticketing.find_ticket(id).await?.into()))
}
