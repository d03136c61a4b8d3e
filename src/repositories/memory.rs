use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::models::{
    movie_model::Movie,
    room_model::Room,
    session_model::{MovieSession, TimeSlot},
    ticket_model::{Ticket, WatchHistoryEntry},
    user_model::User,
};

use super::{
    MovieRepository, RoomRepository, SessionFilter, SessionRepository, StoreError, StoreResult,
    TicketRepository, UserRepository, WatchHistoryRepository,
};

#[derive(Default)]
struct Tables {
    movies: Vec<Movie>,
    rooms: Vec<Room>,
    sessions: Vec<MovieSession>,
    tickets: Vec<Ticket>,
    watch_history: Vec<WatchHistoryEntry>,
    users: Vec<User>,
}

/// Vec-backed store mirroring the unique indexes of the MongoDB backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    watch_insert_fault: AtomicBool,
    ticket_save_fault: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn watch_history_len(&self) -> usize {
        self.tables.read().await.watch_history.len()
    }

    /// Makes the next `insert_watch_entry` fail with a backend error.
    pub fn fail_next_watch_insert(&self) {
        self.watch_insert_fault.store(true, Ordering::SeqCst);
    }

    /// Makes the next `save_ticket` fail with a backend error.
    pub fn fail_next_ticket_save(&self) {
        self.ticket_save_fault.store(true, Ordering::SeqCst);
    }
}

fn injected(fault: &AtomicBool) -> StoreResult<()> {
    if fault.swap(false, Ordering::SeqCst) {
        Err(StoreError::Backend("injected failure".to_string()))
    } else {
        Ok(())
    }
}

fn upsert<T: Clone>(rows: &mut Vec<T>, value: &T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|row| same(row)) {
        Some(row) => *row = value.clone(),
        None => rows.push(value.clone()),
    }
}

fn remove_where<T>(rows: &mut Vec<T>, doomed: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|row| !doomed(row));
    (before - rows.len()) as u64
}

fn slot_taken(sessions: &[MovieSession], candidate: &MovieSession) -> bool {
    sessions.iter().any(|s| {
        s.id != candidate.id
            && s.date == candidate.date
            && s.room_id == candidate.room_id
            && s.time_slot == candidate.time_slot
    })
}

#[async_trait]
impl MovieRepository for MemoryStore {
    async fn insert_movie(&self, movie: &Movie) -> StoreResult<()> {
        self.tables.write().await.movies.push(movie.clone());
        Ok(())
    }

    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn find_movies_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables
            .movies
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        Ok(self.tables.read().await.movies.clone())
    }

    async fn save_movie(&self, movie: &Movie) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        upsert(&mut tables.movies, movie, |m| m.id == movie.id);
        Ok(())
    }

    async fn delete_movie(&self, id: ObjectId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.movies, |m| m.id == id) == 1)
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn insert_room(&self, room: &Room) -> StoreResult<()> {
        self.save_room(room).await
    }

    async fn find_room(&self, id: ObjectId) -> StoreResult<Option<Room>> {
        let tables = self.tables.read().await;
        Ok(tables.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn find_rooms_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Room>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rooms
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        Ok(self.tables.read().await.rooms.clone())
    }

    async fn save_room(&self, room: &Room) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .rooms
            .iter()
            .any(|r| r.id != room.id && r.room_number == room.room_number)
        {
            return Err(StoreError::Duplicate(format!(
                "Room {} already exists",
                room.room_number
            )));
        }
        upsert(&mut tables.rooms, room, |r| r.id == room.id);
        Ok(())
    }

    async fn delete_room(&self, id: ObjectId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.rooms, |r| r.id == id) == 1)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, session: &MovieSession) -> StoreResult<()> {
        self.save_session(session).await
    }

    async fn find_session(&self, id: ObjectId) -> StoreResult<Option<MovieSession>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn find_session_by_slot(
        &self,
        date: NaiveDate,
        room_id: ObjectId,
        time_slot: TimeSlot,
    ) -> StoreResult<Option<MovieSession>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.date == date && s.room_id == room_id && s.time_slot == time_slot)
            .cloned())
    }

    async fn find_sessions(&self, filter: &SessionFilter) -> StoreResult<Vec<MovieSession>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<_> = tables
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.time_slot));
        Ok(sessions)
    }

    async fn save_session(&self, session: &MovieSession) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if slot_taken(&tables.sessions, session) {
            return Err(StoreError::Duplicate(
                "A session for this room, date and time slot already exists".to_string(),
            ));
        }
        upsert(&mut tables.sessions, session, |s| s.id == session.id);
        Ok(())
    }

    async fn delete_sessions(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.sessions, |s| ids.contains(&s.id)))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        self.tables.write().await.tickets.push(ticket.clone());
        Ok(())
    }

    async fn find_ticket(&self, id: ObjectId) -> StoreResult<Option<Ticket>> {
        let tables = self.tables.read().await;
        Ok(tables.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        Ok(self.tables.read().await.tickets.clone())
    }

    async fn find_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<Ticket>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        injected(&self.ticket_save_fault)?;
        let mut tables = self.tables.write().await;
        upsert(&mut tables.tickets, ticket, |t| t.id == ticket.id);
        Ok(())
    }

    async fn delete_ticket(&self, id: ObjectId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.tickets, |t| t.id == id) == 1)
    }

    async fn delete_tickets_by_sessions(&self, session_ids: &[ObjectId]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.tickets, |t| {
            session_ids.contains(&t.session_id)
        }))
    }

    async fn delete_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.tickets, |t| t.user_id == user_id))
    }
}

#[async_trait]
impl WatchHistoryRepository for MemoryStore {
    async fn insert_watch_entry(&self, entry: &WatchHistoryEntry) -> StoreResult<()> {
        injected(&self.watch_insert_fault)?;
        let mut tables = self.tables.write().await;
        if tables.watch_history.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::Duplicate("Watch history entry already exists".to_string()));
        }
        tables.watch_history.push(entry.clone());
        Ok(())
    }

    async fn find_watch_history(&self, user_id: ObjectId) -> StoreResult<Vec<WatchHistoryEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<_> = tables
            .watch_history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(entries)
    }

    async fn delete_watch_history_by_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.watch_history, |e| e.user_id == user_id))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.save_user(user).await
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StoreError::Duplicate(format!(
                "User with username: {} already exists",
                user.username
            )));
        }
        upsert(&mut tables.users, user, |u| u.id == user.id);
        Ok(())
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.users, |u| u.id == id) == 1)
    }
}
