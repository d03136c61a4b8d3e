//! Persistence seams, one trait per aggregate.
//!
//! Services only see these traits. [`mongo::MongoStore`] backs them in
//! production; the in-memory store backs the test suite. Both enforce the
//! same uniqueness rules: `users.username`, `rooms.room_number` and the
//! `(date, room_id, time_slot)` triple of `movie_sessions`.

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{
    movie_model::Movie,
    room_model::Room,
    session_model::{MovieSession, TimeSlot},
    ticket_model::{Ticket, WatchHistoryEntry},
    user_model::User,
};

#[cfg(test)]
pub mod memory;
pub mod mongo;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Narrowing applied by [`SessionRepository::find_sessions`]. Unset fields
/// do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub movie_id: Option<ObjectId>,
    pub room_id: Option<ObjectId>,
    pub date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
}

impl SessionFilter {
    pub fn matches(&self, session: &MovieSession) -> bool {
        self.movie_id.map_or(true, |id| session.movie_id == id)
            && self.room_id.map_or(true, |id| session.room_id == id)
            && self.date.map_or(true, |date| session.date == date)
            && self.from_date.map_or(true, |date| session.date >= date)
    }
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn insert_movie(&self, movie: &Movie) -> StoreResult<()>;
    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>>;
    async fn find_movies_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Movie>>;
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    async fn save_movie(&self, movie: &Movie) -> StoreResult<()>;
    async fn delete_movie(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn insert_room(&self, room: &Room) -> StoreResult<()>;
    async fn find_room(&self, id: ObjectId) -> StoreResult<Option<Room>>;
    async fn find_rooms_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Room>>;
    async fn list_rooms(&self) -> StoreResult<Vec<Room>>;
    async fn save_room(&self, room: &Room) -> StoreResult<()>;
    async fn delete_room(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: &MovieSession) -> StoreResult<()>;
    async fn find_session(&self, id: ObjectId) -> StoreResult<Option<MovieSession>>;
    async fn find_session_by_slot(
        &self,
        date: NaiveDate,
        room_id: ObjectId,
        time_slot: TimeSlot,
    ) -> StoreResult<Option<MovieSession>>;
    async fn find_sessions(&self, filter: &SessionFilter) -> StoreResult<Vec<MovieSession>>;
    async fn save_session(&self, session: &MovieSession) -> StoreResult<()>;
    async fn delete_sessions(&self, ids: &[ObjectId]) -> StoreResult<u64>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()>;
    async fn find_ticket(&self, id: ObjectId) -> StoreResult<Option<Ticket>>;
    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>>;
    async fn find_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<Ticket>>;
    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()>;
    async fn delete_ticket(&self, id: ObjectId) -> StoreResult<bool>;
    async fn delete_tickets_by_sessions(&self, session_ids: &[ObjectId]) -> StoreResult<u64>;
    async fn delete_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<u64>;
}

#[async_trait]
pub trait WatchHistoryRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when `entry.id` is already stored.
    async fn insert_watch_entry(&self, entry: &WatchHistoryEntry) -> StoreResult<()>;
    /// Entries of one user, most recent `watched_at` first.
    async fn find_watch_history(&self, user_id: ObjectId) -> StoreResult<Vec<WatchHistoryEntry>>;
    async fn delete_watch_history_by_user(&self, user_id: ObjectId) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn save_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool>;
}

/// Everything the services need from a backend.
pub trait Store:
    MovieRepository
    + RoomRepository
    + SessionRepository
    + TicketRepository
    + WatchHistoryRepository
    + UserRepository
{
}

impl<T> Store for T where
    T: MovieRepository
        + RoomRepository
        + SessionRepository
        + TicketRepository
        + WatchHistoryRepository
        + UserRepository
{
}
