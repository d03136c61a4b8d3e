use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::serialize_object_id;

use super::movie_model::{Movie, MovieResponse};
use super::room_model::{Room, RoomResponse};
use super::validation::{FieldError, Validate, Violations};

/// The seven fixed two-hour exhibition bands of a day, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "10:00-12:00")]
    Slot1,
    #[serde(rename = "12:00-14:00")]
    Slot2,
    #[serde(rename = "14:00-16:00")]
    Slot3,
    #[serde(rename = "16:00-18:00")]
    Slot4,
    #[serde(rename = "18:00-20:00")]
    Slot5,
    #[serde(rename = "20:00-22:00")]
    Slot6,
    #[serde(rename = "22:00-00:00")]
    Slot7,
}

impl TimeSlot {
    #[cfg(test)]
    pub const ALL: [TimeSlot; 7] = [
        TimeSlot::Slot1,
        TimeSlot::Slot2,
        TimeSlot::Slot3,
        TimeSlot::Slot4,
        TimeSlot::Slot5,
        TimeSlot::Slot6,
        TimeSlot::Slot7,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Slot1 => "10:00-12:00",
            TimeSlot::Slot2 => "12:00-14:00",
            TimeSlot::Slot3 => "14:00-16:00",
            TimeSlot::Slot4 => "16:00-18:00",
            TimeSlot::Slot5 => "18:00-20:00",
            TimeSlot::Slot6 => "20:00-22:00",
            TimeSlot::Slot7 => "22:00-00:00",
        }
    }

    fn start_hour(self) -> u32 {
        10 + 2 * (self as u32)
    }

    /// UTC instants bounding this slot on `date`, both inclusive.
    ///
    /// The last slot ends at midnight, which belongs to the following day.
    pub fn window_on(self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start_hour = self.start_hour();
        let start = date.and_time(NaiveTime::MIN) + chrono::Duration::hours(start_hour as i64);
        let end = start + chrono::Duration::hours(2);
        (start.and_utc(), end.and_utc())
    }

    pub fn contains(self, date: NaiveDate, at: DateTime<Utc>) -> bool {
        let (start, end) = self.window_on(date);
        start <= at && at <= end
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MovieSession {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub movie_id: ObjectId,
    pub room_id: ObjectId,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

/// A session with its movie and room resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDetail {
    pub session: MovieSession,
    pub movie: Movie,
    pub room: Room,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CreateSession {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub movie_id: String,
    pub room_id: String,
}

impl Validate for CreateSession {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.object_id(&self.movie_id, "movie_id");
        violations.object_id(&self.room_id, "room_id");
        violations.finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionUpdate {
    pub date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub movie_id: Option<String>,
    pub room_id: Option<String>,
}

impl Validate for SessionUpdate {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        if let Some(movie_id) = &self.movie_id {
            violations.object_id(movie_id, "movie_id");
        }
        if let Some(room_id) = &self.room_id {
            violations.object_id(room_id, "room_id");
        }
        violations.finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionDateFilter {
    pub date: Option<NaiveDate>,
}

impl Validate for SessionDateFilter {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Ok(())
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub movie: MovieResponse,
    pub room: RoomResponse,
}

impl From<SessionDetail> for SessionResponse {
    fn from(detail: SessionDetail) -> Self {
        SessionResponse {
            id: detail.session.id,
            date: detail.session.date,
            time_slot: detail.session.time_slot,
            movie: detail.movie.into(),
            room: detail.room.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

impl From<Vec<SessionDetail>> for SessionsResponse {
    fn from(details: Vec<SessionDetail>) -> Self {
        SessionsResponse {
            sessions: details.into_iter().map(SessionResponse::from).collect(),
        }
    }
}
