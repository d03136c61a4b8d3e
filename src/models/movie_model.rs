use std::collections::BTreeMap;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::serialize_object_id;

use super::session_model::TimeSlot;
use super::validation::{FieldError, Validate, Violations};

pub const MAX_AGE_RESTRICTION: i32 = 24;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age_restriction: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateMovie {
    pub name: String,
    pub age_restriction: i32,
}

impl CreateMovie {
    pub fn into_movie(self) -> Movie {
        Movie {
            id: ObjectId::new(),
            name: self.name,
            age_restriction: self.age_restriction,
        }
    }
}

impl Validate for CreateMovie {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.not_blank(&self.name, "name");
        violations.in_range(self.age_restriction, 0, MAX_AGE_RESTRICTION, "age_restriction");
        violations.finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkCreateMovies {
    pub movies: Vec<CreateMovie>,
}

impl Validate for BulkCreateMovies {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.check(!self.movies.is_empty(), "movies", "movies should not be empty");
        for (index, movie) in self.movies.iter().enumerate() {
            violations.nest(&format!("movies[{index}]"), movie.validate());
        }
        violations.finish()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MovieUpdate {
    pub name: Option<String>,
    pub age_restriction: Option<i32>,
}

impl MovieUpdate {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(name) = self.name {
            movie.name = name;
        }
        if let Some(age_restriction) = self.age_restriction {
            movie.age_restriction = age_restriction;
        }
    }
}

impl Validate for MovieUpdate {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        if let Some(name) = &self.name {
            violations.not_blank(name, "name");
        }
        if let Some(age_restriction) = self.age_restriction {
            violations.in_range(age_restriction, 0, MAX_AGE_RESTRICTION, "age_restriction");
        }
        violations.finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkRemoveMovies {
    pub ids: Vec<String>,
}

impl Validate for BulkRemoveMovies {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.check(!self.ids.is_empty(), "ids", "ids should not be empty");
        for (index, id) in self.ids.iter().enumerate() {
            violations.object_id(id, format!("ids[{index}]"));
        }
        violations.finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InTheatresFilter {
    pub date: Option<NaiveDate>,
    pub age_restriction: Option<i32>,
    pub movie_name: Option<String>,
    #[serde(default)]
    pub order_by: SortOrder,
}

impl Validate for InTheatresFilter {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        if let Some(age_restriction) = self.age_restriction {
            violations.in_range(age_restriction, 0, MAX_AGE_RESTRICTION, "ageRestriction");
        }
        violations.finish()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MovieResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub name: String,
    pub age_restriction: i32,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        MovieResponse {
            id: movie.id,
            name: movie.name,
            age_restriction: movie.age_restriction,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieResponse>,
}

impl From<Vec<Movie>> for MoviesResponse {
    fn from(movies: Vec<Movie>) -> Self {
        MoviesResponse {
            movies: movies.into_iter().map(MovieResponse::from).collect(),
        }
    }
}

/// One screening inside the in-theatres listing.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ScreeningEntry {
    pub date: NaiveDate,
    #[serde(rename = "sessionId", serialize_with = "serialize_object_id")]
    pub session_id: ObjectId,
    #[serde(rename = "timeSlot")]
    pub time_slot: TimeSlot,
    #[serde(serialize_with = "serialize_object_id")]
    pub room_id: ObjectId,
    pub room_number: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieWithSessions {
    #[serde(serialize_with = "serialize_object_id")]
    pub movie_id: ObjectId,
    pub movie_title: String,
    /// Screenings grouped by their `YYYY-MM-DD` date.
    pub sessions: BTreeMap<String, Vec<ScreeningEntry>>,
}

#[derive(Debug, Serialize)]
pub struct MoviesWithSessionsResponse {
    pub movies: Vec<MovieWithSessions>,
}
