use axum::Json;

use crate::models::MessageResponse;

pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Cinema booking API is up"))
}
