use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::serialize_object_id;

use super::validation::{FieldError, Validate, Violations};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub room_number: String,
    pub capacity: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateRoom {
    pub room_number: String,
    pub capacity: Option<i32>,
}

impl CreateRoom {
    pub fn into_room(self) -> Room {
        Room {
            id: ObjectId::new(),
            room_number: self.room_number,
            capacity: self.capacity,
        }
    }
}

fn check_capacity(violations: &mut Violations, capacity: Option<i32>) {
    if let Some(capacity) = capacity {
        violations.check(capacity >= 0, "capacity", "capacity must not be less than 0");
    }
}

impl Validate for CreateRoom {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.not_blank(&self.room_number, "room_number");
        check_capacity(&mut violations, self.capacity);
        violations.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub capacity: Option<i32>,
}

impl RoomUpdate {
    pub fn apply(self, room: &mut Room) {
        if let Some(room_number) = self.room_number {
            room.room_number = room_number;
        }
        if self.capacity.is_some() {
            room.capacity = self.capacity;
        }
    }
}

impl Validate for RoomUpdate {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        if let Some(room_number) = &self.room_number {
            violations.not_blank(room_number, "room_number");
        }
        check_capacity(&mut violations, self.capacity);
        violations.finish()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RoomResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub room_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        RoomResponse {
            id: room.id,
            room_number: room.room_number,
            capacity: room.capacity,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomResponse>,
}

impl From<Vec<Room>> for RoomsResponse {
    fn from(rooms: Vec<Room>) -> Self {
        RoomsResponse {
            rooms: rooms.into_iter().map(RoomResponse::from).collect(),
        }
    }
}
