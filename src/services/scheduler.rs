use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::movie_model::Movie;
use crate::models::room_model::Room;
use crate::models::session_model::{MovieSession, SessionDetail, TimeSlot};
use crate::repositories::{SessionFilter, Store};

use super::CatalogService;

/// Requested changes to an existing session. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub movie_id: Option<ObjectId>,
    pub room_id: Option<ObjectId>,
}

/// Movie sessions, at most one per room, date and time slot.
#[derive(Clone)]
pub struct SessionScheduler {
    store: Arc<dyn Store>,
    catalog: CatalogService,
}

impl SessionScheduler {
    pub fn new(store: Arc<dyn Store>, catalog: CatalogService) -> Self {
        SessionScheduler { store, catalog }
    }

    pub async fn create_session(
        &self,
        date: NaiveDate,
        room_id: ObjectId,
        time_slot: TimeSlot,
        movie_id: ObjectId,
    ) -> AppResult<SessionDetail> {
        let movie = self.catalog.find_movie(movie_id).await?;
        let room = self.catalog.find_room(room_id).await?;
        self.ensure_slot_free(date, &room, time_slot, None).await?;

        let session = MovieSession {
            id: ObjectId::new(),
            movie_id: movie.id,
            room_id: room.id,
            date,
            time_slot,
        };
        self.store.insert_session(&session).await?;
        tracing::info!(
            session_id = %session.id,
            room = %room.room_number,
            %date,
            slot = time_slot.as_str(),
            "session scheduled"
        );
        Ok(SessionDetail {
            session,
            movie,
            room,
        })
    }

    pub async fn update_session(
        &self,
        id: ObjectId,
        changes: SessionChanges,
    ) -> AppResult<SessionDetail> {
        let current = self.find_session(id).await?;
        let movie = match changes.movie_id {
            Some(movie_id) => self.catalog.find_movie(movie_id).await?,
            None => current.movie,
        };
        let room = match changes.room_id {
            Some(room_id) => self.catalog.find_room(room_id).await?,
            None => current.room,
        };

        let mut session = current.session;
        let date = changes.date.unwrap_or(session.date);
        let time_slot = changes.time_slot.unwrap_or(session.time_slot);
        let moved = date != session.date || time_slot != session.time_slot || room.id != session.room_id;
        if moved {
            self.ensure_slot_free(date, &room, time_slot, Some(session.id))
                .await?;
        }

        session.date = date;
        session.time_slot = time_slot;
        session.movie_id = movie.id;
        session.room_id = room.id;
        self.store.save_session(&session).await?;
        Ok(SessionDetail {
            session,
            movie,
            room,
        })
    }

    /// The session occupying `room_id` at `date`/`time_slot`, if any.
    pub async fn find_overlapping_session(
        &self,
        date: NaiveDate,
        room_id: ObjectId,
        time_slot: TimeSlot,
    ) -> AppResult<Option<MovieSession>> {
        Ok(self
            .store
            .find_session_by_slot(date, room_id, time_slot)
            .await?)
    }

    async fn ensure_slot_free(
        &self,
        date: NaiveDate,
        room: &Room,
        time_slot: TimeSlot,
        ignore: Option<ObjectId>,
    ) -> AppResult<()> {
        let Some(existing) = self
            .find_overlapping_session(date, room.id, time_slot)
            .await?
            .filter(|existing| Some(existing.id) != ignore)
        else {
            return Ok(());
        };

        let blocking = self
            .store
            .find_movie(existing.movie_id)
            .await?
            .map(|movie| movie.name)
            .unwrap_or_else(|| "another movie".to_string());
        Err(AppError::Conflict(format!(
            "A session is already defined for room: {}, date: {date} and time slot: {time_slot} for {blocking}",
            room.room_number
        )))
    }

    pub async fn remove_session(&self, id: ObjectId) -> AppResult<()> {
        let session = self.find_session_record(id).await?;
        let ids = [session.id];
        let tickets = self.store.delete_tickets_by_sessions(&ids).await?;
        self.store.delete_sessions(&ids).await?;
        tracing::info!(session_id = %session.id, tickets, "session removed");
        Ok(())
    }

    pub async fn find_session(&self, id: ObjectId) -> AppResult<SessionDetail> {
        let session = self.find_session_record(id).await?;
        let movie = self.catalog.find_movie(session.movie_id).await?;
        let room = self.catalog.find_room(session.room_id).await?;
        Ok(SessionDetail {
            session,
            movie,
            room,
        })
    }

    pub async fn list_sessions(&self) -> AppResult<Vec<SessionDetail>> {
        let sessions = self.store.find_sessions(&SessionFilter::default()).await?;
        self.attach(sessions).await
    }

    /// Sessions of one movie, optionally narrowed to a single date.
    pub async fn find_sessions_by_movie(
        &self,
        movie_id: ObjectId,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<SessionDetail>> {
        let filter = SessionFilter {
            movie_id: Some(movie_id),
            date,
            ..SessionFilter::default()
        };
        let sessions = self.store.find_sessions(&filter).await?;
        self.attach(sessions).await
    }

    async fn find_session_record(&self, id: ObjectId) -> AppResult<MovieSession> {
        self.store
            .find_session(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cannot find session with ID: {id}")))
    }

    async fn attach(&self, sessions: Vec<MovieSession>) -> AppResult<Vec<SessionDetail>> {
        if sessions.is_empty() {
            return Ok(Vec::new());
        }
        let movie_ids: Vec<ObjectId> = sessions
            .iter()
            .map(|s| s.movie_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let room_ids: Vec<ObjectId> = sessions
            .iter()
            .map(|s| s.room_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let movies: HashMap<ObjectId, Movie> = self
            .store
            .find_movies_by_ids(&movie_ids)
            .await?
            .into_iter()
            .map(|movie| (movie.id, movie))
            .collect();
        let rooms: HashMap<ObjectId, Room> = self
            .store
            .find_rooms_by_ids(&room_ids)
            .await?
            .into_iter()
            .map(|room| (room.id, room))
            .collect();

        Ok(sessions
            .into_iter()
            .filter_map(|session| {
                let movie = movies.get(&session.movie_id)?.clone();
                let room = rooms.get(&session.room_id)?.clone();
                Some(SessionDetail {
                    session,
                    movie,
                    room,
                })
            })
            .collect())
    }
}
