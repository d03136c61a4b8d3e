use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::movie_model::{
    CreateMovie, InTheatresFilter, Movie, MovieUpdate, MovieWithSessions, ScreeningEntry,
    SortOrder,
};
use crate::models::room_model::{CreateRoom, Room, RoomUpdate};
use crate::repositories::{SessionFilter, Store};
use crate::utils::today;

use super::purge_sessions;

/// Movies and rooms.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        CatalogService { store }
    }

    pub async fn create_movie(&self, request: CreateMovie) -> AppResult<Movie> {
        let movie = request.into_movie();
        self.store.insert_movie(&movie).await?;
        tracing::info!(movie_id = %movie.id, name = %movie.name, "movie created");
        Ok(movie)
    }

    /// Independent inserts, not wrapped in a transaction.
    pub async fn bulk_create_movies(&self, requests: Vec<CreateMovie>) -> AppResult<Vec<Movie>> {
        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(self.create_movie(request).await?);
        }
        Ok(created)
    }

    pub async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        Ok(self.store.list_movies().await?)
    }

    pub async fn find_movie(&self, id: ObjectId) -> AppResult<Movie> {
        self.store
            .find_movie(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cannot find movie with ID: {id}")))
    }

    pub async fn update_movie(&self, id: ObjectId, update: MovieUpdate) -> AppResult<Movie> {
        let mut movie = self.find_movie(id).await?;
        update.apply(&mut movie);
        self.store.save_movie(&movie).await?;
        Ok(movie)
    }

    pub async fn remove_movie(&self, id: ObjectId) -> AppResult<()> {
        let movie = self.find_movie(id).await?;
        self.delete_movie_cascade(movie.id).await
    }

    /// Fails before deleting anything if any id is unknown.
    pub async fn bulk_remove_movies(&self, ids: Vec<ObjectId>) -> AppResult<()> {
        let mut seen = HashSet::new();
        let ids: Vec<ObjectId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let found: HashSet<ObjectId> = self
            .store
            .find_movies_by_ids(&ids)
            .await?
            .into_iter()
            .map(|movie| movie.id)
            .collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_hex())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Cannot find movies with IDs {}",
                missing.join(", ")
            )));
        }

        for id in ids {
            self.delete_movie_cascade(id).await?;
        }
        Ok(())
    }

    async fn delete_movie_cascade(&self, id: ObjectId) -> AppResult<()> {
        let filter = SessionFilter {
            movie_id: Some(id),
            ..SessionFilter::default()
        };
        purge_sessions(self.store.as_ref(), filter).await?;
        self.store.delete_movie(id).await?;
        tracing::info!(movie_id = %id, "movie removed");
        Ok(())
    }

    /// Upcoming screenings grouped per movie and per date.
    ///
    /// Without a `date` only sessions from today (UTC) onwards are listed.
    /// Movies with no matching session are left out.
    pub async fn find_movies_in_theatres(
        &self,
        filter: InTheatresFilter,
    ) -> AppResult<Vec<MovieWithSessions>> {
        let session_filter = SessionFilter {
            date: filter.date,
            from_date: filter.date.is_none().then(today),
            ..SessionFilter::default()
        };
        let mut sessions = self.store.find_sessions(&session_filter).await?;
        sessions.sort_by_key(|s| (s.date, s.time_slot));
        if filter.order_by == SortOrder::Desc {
            sessions.reverse();
        }

        let name_needle = filter.movie_name.as_deref().map(str::to_lowercase);
        let movies: HashMap<ObjectId, Movie> = self
            .store
            .list_movies()
            .await?
            .into_iter()
            .filter(|movie| {
                filter
                    .age_restriction
                    .map_or(true, |max| movie.age_restriction <= max)
            })
            .filter(|movie| {
                name_needle
                    .as_deref()
                    .map_or(true, |needle| movie.name.to_lowercase().contains(needle))
            })
            .map(|movie| (movie.id, movie))
            .collect();
        let rooms: HashMap<ObjectId, Room> = self
            .store
            .list_rooms()
            .await?
            .into_iter()
            .map(|room| (room.id, room))
            .collect();

        let mut listing: Vec<MovieWithSessions> = Vec::new();
        let mut position: HashMap<ObjectId, usize> = HashMap::new();
        for session in sessions {
            let (Some(movie), Some(room)) = (movies.get(&session.movie_id), rooms.get(&session.room_id))
            else {
                continue;
            };
            let index = *position.entry(movie.id).or_insert_with(|| {
                listing.push(MovieWithSessions {
                    movie_id: movie.id,
                    movie_title: movie.name.clone(),
                    sessions: BTreeMap::new(),
                });
                listing.len() - 1
            });
            listing[index]
                .sessions
                .entry(session.date.to_string())
                .or_default()
                .push(ScreeningEntry {
                    date: session.date,
                    session_id: session.id,
                    time_slot: session.time_slot,
                    room_id: room.id,
                    room_number: room.room_number.clone(),
                });
        }
        Ok(listing)
    }

    pub async fn create_room(&self, request: CreateRoom) -> AppResult<Room> {
        let room = request.into_room();
        self.store.insert_room(&room).await?;
        tracing::info!(room_id = %room.id, room_number = %room.room_number, "room created");
        Ok(room)
    }

    pub async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        Ok(self.store.list_rooms().await?)
    }

    pub async fn find_room(&self, id: ObjectId) -> AppResult<Room> {
        self.store
            .find_room(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cannot find room with ID: {id}")))
    }

    pub async fn update_room(&self, id: ObjectId, update: RoomUpdate) -> AppResult<Room> {
        let mut room = self.find_room(id).await?;
        update.apply(&mut room);
        self.store.save_room(&room).await?;
        Ok(room)
    }

    pub async fn remove_room(&self, id: ObjectId) -> AppResult<()> {
        let room = self.find_room(id).await?;
        let filter = SessionFilter {
            room_id: Some(room.id),
            ..SessionFilter::default()
        };
        purge_sessions(self.store.as_ref(), filter).await?;
        self.store.delete_room(room.id).await?;
        tracing::info!(room_id = %room.id, "room removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;
    use crate::models::session_model::TimeSlot;
    use crate::repositories::{MovieRepository, SessionRepository};
    use crate::models::user_model::{Principal, SignUp};
    use crate::services::fixtures::{date, harness, principal, Harness};

    fn movie(name: &str, age_restriction: i32) -> CreateMovie {
        CreateMovie {
            name: name.into(),
            age_restriction,
        }
    }

    fn room(number: &str) -> CreateRoom {
        CreateRoom {
            room_number: number.into(),
            capacity: Some(100),
        }
    }

    async fn customer(h: &Harness) -> Principal {
        let user = h
            .identity
            .sign_up(SignUp {
                username: "jane".into(),
                password: "secret-pass".into(),
                age: 30,
            })
            .await
            .unwrap();
        principal(&user)
    }

    #[tokio::test]
    async fn bulk_remove_with_unknown_id_deletes_nothing() {
        let h = harness();
        let kept = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let missing = ObjectId::new();

        let err = h
            .catalog
            .bulk_remove_movies(vec![kept.id, missing])
            .await
            .unwrap_err();

        match err {
            AppError::NotFound(message) => assert!(message.contains(&missing.to_hex())),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(h.store.find_movie(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bulk_remove_tolerates_duplicate_ids() {
        let h = harness();
        let created = h
            .catalog
            .bulk_create_movies(vec![movie("Inception", 13), movie("Up", 0)])
            .await
            .unwrap();
        let id = created[0].id;

        h.catalog.bulk_remove_movies(vec![id, id]).await.unwrap();

        let remaining = h.catalog.list_movies().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Up");
    }

    #[tokio::test]
    async fn removing_a_movie_removes_its_sessions_and_tickets() {
        let h = harness();
        let inception = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let up = h.catalog.create_movie(movie("Up", 0)).await.unwrap();
        let screen = h.catalog.create_room(room("Room 101")).await.unwrap();
        let day = date(2030, 1, 1);
        let doomed = h
            .scheduler
            .create_session(day, screen.id, TimeSlot::Slot1, inception.id)
            .await
            .unwrap();
        let kept = h
            .scheduler
            .create_session(day, screen.id, TimeSlot::Slot2, up.id)
            .await
            .unwrap();
        let buyer = customer(&h).await;
        h.ticketing
            .create_ticket(doomed.session.id, &buyer)
            .await
            .unwrap();
        h.ticketing
            .create_ticket(kept.session.id, &buyer)
            .await
            .unwrap();

        h.catalog.remove_movie(inception.id).await.unwrap();

        let sessions = h.store.find_sessions(&SessionFilter::default()).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].movie_id, up.id);
        let tickets = h.ticketing.list_all_tickets().await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].session_id, kept.session.id);
    }

    #[tokio::test]
    async fn removing_a_room_removes_its_sessions_and_tickets() {
        let h = harness();
        let inception = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let screen = h.catalog.create_room(room("Room 101")).await.unwrap();
        let session = h
            .scheduler
            .create_session(date(2030, 1, 1), screen.id, TimeSlot::Slot1, inception.id)
            .await
            .unwrap();
        let buyer = customer(&h).await;
        h.ticketing
            .create_ticket(session.session.id, &buyer)
            .await
            .unwrap();

        h.catalog.remove_room(screen.id).await.unwrap();

        assert!(h
            .store
            .find_sessions(&SessionFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            h.catalog.find_room(screen.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(h.ticketing.list_all_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_room_numbers_conflict() {
        let h = harness();
        h.catalog.create_room(room("Room 101")).await.unwrap();
        let err = h.catalog.create_room(room("Room 101")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_movie_keeps_untouched_fields() {
        let h = harness();
        let created = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let updated = h
            .catalog
            .update_movie(
                created.id,
                MovieUpdate {
                    name: Some("Inception (IMAX)".into()),
                    age_restriction: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Inception (IMAX)");
        assert_eq!(updated.age_restriction, 13);
    }

    #[tokio::test]
    async fn in_theatres_groups_by_date_and_applies_filters() {
        let h = harness();
        let inception = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let saw = h.catalog.create_movie(movie("Saw", 18)).await.unwrap();
        let screen = h.catalog.create_room(room("Room 101")).await.unwrap();
        let first = today().checked_add_days(Days::new(1)).unwrap();
        let second = today().checked_add_days(Days::new(2)).unwrap();
        let past = today().checked_sub_days(Days::new(1)).unwrap();

        for (day, slot, movie_id) in [
            (first, TimeSlot::Slot3, inception.id),
            (first, TimeSlot::Slot1, inception.id),
            (second, TimeSlot::Slot1, inception.id),
            (past, TimeSlot::Slot2, inception.id),
            (first, TimeSlot::Slot5, saw.id),
        ] {
            h.scheduler
                .create_session(day, screen.id, slot, movie_id)
                .await
                .unwrap();
        }

        let listing = h
            .catalog
            .find_movies_in_theatres(InTheatresFilter {
                age_restriction: Some(13),
                movie_name: Some("INCEP".into()),
                ..InTheatresFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(listing.len(), 1);
        let entry = &listing[0];
        assert_eq!(entry.movie_title, "Inception");
        assert_eq!(entry.sessions.len(), 2);
        let first_day = &entry.sessions[&first.to_string()];
        let slots: Vec<_> = first_day.iter().map(|s| s.time_slot).collect();
        assert_eq!(slots, vec![TimeSlot::Slot1, TimeSlot::Slot3]);
        assert_eq!(first_day[0].room_number, "Room 101");
    }

    #[tokio::test]
    async fn in_theatres_descending_order_and_exact_date() {
        let h = harness();
        let inception = h.catalog.create_movie(movie("Inception", 13)).await.unwrap();
        let screen = h.catalog.create_room(room("Room 101")).await.unwrap();
        let day = date(2031, 5, 5);
        for slot in [TimeSlot::Slot1, TimeSlot::Slot4] {
            h.scheduler
                .create_session(day, screen.id, slot, inception.id)
                .await
                .unwrap();
        }
        h.scheduler
            .create_session(date(2031, 5, 6), screen.id, TimeSlot::Slot1, inception.id)
            .await
            .unwrap();

        let listing = h
            .catalog
            .find_movies_in_theatres(InTheatresFilter {
                date: Some(day),
                order_by: SortOrder::Desc,
                ..InTheatresFilter::default()
            })
            .await
            .unwrap();

        let sessions = &listing[0].sessions;
        assert_eq!(sessions.len(), 1);
        let slots: Vec<_> = sessions["2031-05-05"].iter().map(|s| s.time_slot).collect();
        assert_eq!(slots, vec![TimeSlot::Slot4, TimeSlot::Slot1]);
    }
}
