use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::utils::serialize_object_id;

use super::session_model::{SessionDetail, SessionResponse, TimeSlot};
use super::validation::{FieldError, Validate, Violations};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub session_id: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
}

/// A ticket with the screening it admits to, when that was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub session: Option<SessionDetail>,
}

/// Ledger row written when a ticket is redeemed; never updated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WatchHistoryEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub movie: String,
    pub time_slot: TimeSlot,
    pub watched_at: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTicket {
    pub session_id: String,
}

impl Validate for CreateTicket {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.object_id(&self.session_id, "session_id");
        violations.finish()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TicketResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    #[serde(serialize_with = "serialize_object_id")]
    pub user_id: ObjectId,
    #[serde(serialize_with = "serialize_object_id")]
    pub session_id: ObjectId,
    pub purchase_date: DateTime<Utc>,
    pub used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionResponse>,
}

impl From<TicketDetail> for TicketResponse {
    fn from(detail: TicketDetail) -> Self {
        let TicketDetail { ticket, session } = detail;
        TicketResponse {
            id: ticket.id,
            user_id: ticket.user_id,
            session_id: ticket.session_id,
            purchase_date: ticket.purchase_date,
            used: ticket.used,
            session: session.map(SessionResponse::from),
        }
    }
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        TicketDetail {
            ticket,
            session: None,
        }
        .into()
    }
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<TicketResponse>,
}

impl<T: Into<TicketResponse>> From<Vec<T>> for TicketsResponse {
    fn from(tickets: Vec<T>) -> Self {
        TicketsResponse {
            tickets: tickets.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WatchHistoryResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub movie: String,
    pub time_slot: TimeSlot,
    pub watched_at: NaiveDate,
}

impl From<WatchHistoryEntry> for WatchHistoryResponse {
    fn from(entry: WatchHistoryEntry) -> Self {
        WatchHistoryResponse {
            id: entry.id,
            movie: entry.movie,
            time_slot: entry.time_slot,
            watched_at: entry.watched_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WatchHistoryListResponse {
    #[serde(rename = "watchHistory")]
    pub watch_history: Vec<WatchHistoryResponse>,
}

impl From<Vec<WatchHistoryEntry>> for WatchHistoryListResponse {
    fn from(entries: Vec<WatchHistoryEntry>) -> Self {
        WatchHistoryListResponse {
            watch_history: entries.into_iter().map(WatchHistoryResponse::from).collect(),
        }
    }
}
