use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod movie_model;
pub mod room_model;
pub mod session_model;
pub mod ticket_model;
pub mod user_model;
pub mod validation;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: &ObjectId) -> Self {
        self.id = Some(id.to_hex());
        self
    }

    pub fn deleted(what: &str, id: &ObjectId) -> Self {
        MessageResponse {
            message: format!("{what} deleted successfully"),
            id: Some(id.to_hex()),
        }
    }
}
