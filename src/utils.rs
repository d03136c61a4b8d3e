use chrono::{NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serializer;

use crate::error::AppError;

pub fn serialize_object_id<S>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&id.to_hex())
}

pub fn parse_object_id(id_str: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id_str).map_err(|_| AppError::BadRequest(format!("Invalid ID: {id_str}")))
}

pub fn is_object_id(id_str: &str) -> bool {
    ObjectId::parse_str(id_str).is_ok()
}

/// Current calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
