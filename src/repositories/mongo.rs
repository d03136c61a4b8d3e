use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};

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

const MOVIES: &str = "movies";
const ROOMS: &str = "rooms";
const SESSIONS: &str = "movie_sessions";
const TICKETS: &str = "tickets";
const WATCH_HISTORY: &str = "watch_history";
const USERS: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(database);

        db.run_command(doc! {"ping": 1}, None).await?;
        tracing::info!(database, "connected to MongoDB");

        Ok(MongoStore { db })
    }

    /// Unique indexes backing the application-level conflict checks.
    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<MovieSession>(SESSIONS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! {"date": 1, "room_id": 1, "time_slot": 1})
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.collection::<User>(USERS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! {"username": 1})
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.collection::<Room>(ROOMS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! {"room_number": 1})
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.collection::<Ticket>(TICKETS)
            .create_index(IndexModel::builder().keys(doc! {"user_id": 1}).build(), None)
            .await?;
        self.collection::<WatchHistoryEntry>(WATCH_HISTORY)
            .create_index(
                IndexModel::builder()
                    .keys(doc! {"user_id": 1, "watched_at": -1})
                    .build(),
                None,
            )
            .await?;

        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection::<T>(name)
    }

    async fn insert<T>(&self, name: &str, value: &T, what: &str) -> StoreResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(name)
            .insert_one(value, None)
            .await
            .map(|_| ())
            .map_err(|e| map_write_error(e, what))
    }

    async fn replace<T>(&self, name: &str, id: ObjectId, value: &T, what: &str) -> StoreResult<()>
    where
        T: Serialize + Send + Sync,
    {
        self.collection::<T>(name)
            .replace_one(doc! {"_id": id}, value, None)
            .await
            .map(|_| ())
            .map_err(|e| map_write_error(e, what))
    }

    async fn find_by_id<T>(&self, name: &str, id: ObjectId) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        self.collection::<T>(name)
            .find_one(doc! {"_id": id}, None)
            .await
            .map_err(backend)
    }

    async fn find_many<T>(
        &self,
        name: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = self
            .collection::<T>(name)
            .find(filter, options)
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn delete_where(&self, name: &str, filter: Document) -> StoreResult<u64> {
        self.collection::<Document>(name)
            .delete_many(filter, None)
            .await
            .map(|result| result.deleted_count)
            .map_err(backend)
    }

    async fn delete_by_id(&self, name: &str, id: ObjectId) -> StoreResult<bool> {
        self.collection::<Document>(name)
            .delete_one(doc! {"_id": id}, None)
            .await
            .map(|result| result.deleted_count == 1)
            .map_err(backend)
    }
}

fn backend(err: MongoError) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn map_write_error(err: MongoError, what: &str) -> StoreError {
    let duplicate = matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    );
    if duplicate {
        StoreError::Duplicate(format!("{what} already exists"))
    } else {
        backend(err)
    }
}

fn session_query(filter: &SessionFilter) -> Document {
    let mut query = Document::new();
    if let Some(movie_id) = filter.movie_id {
        query.insert("movie_id", movie_id);
    }
    if let Some(room_id) = filter.room_id {
        query.insert("room_id", room_id);
    }

    let mut date_clause = Document::new();
    if let Some(date) = filter.date {
        date_clause.insert("$eq", date.to_string());
    }
    if let Some(from_date) = filter.from_date {
        date_clause.insert("$gte", from_date.to_string());
    }
    if !date_clause.is_empty() {
        query.insert("date", date_clause);
    }
    query
}

#[async_trait]
impl MovieRepository for MongoStore {
    async fn insert_movie(&self, movie: &Movie) -> StoreResult<()> {
        self.insert(MOVIES, movie, "Movie").await
    }

    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>> {
        self.find_by_id(MOVIES, id).await
    }

    async fn find_movies_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Movie>> {
        self.find_many(MOVIES, doc! {"_id": {"$in": ids.to_vec()}}, None)
            .await
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        self.find_many(MOVIES, doc! {}, None).await
    }

    async fn save_movie(&self, movie: &Movie) -> StoreResult<()> {
        self.replace(MOVIES, movie.id, movie, "Movie").await
    }

    async fn delete_movie(&self, id: ObjectId) -> StoreResult<bool> {
        self.delete_by_id(MOVIES, id).await
    }
}

#[async_trait]
impl RoomRepository for MongoStore {
    async fn insert_room(&self, room: &Room) -> StoreResult<()> {
        self.insert(ROOMS, room, &format!("Room {}", room.room_number))
            .await
    }

    async fn find_room(&self, id: ObjectId) -> StoreResult<Option<Room>> {
        self.find_by_id(ROOMS, id).await
    }

    async fn find_rooms_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Room>> {
        self.find_many(ROOMS, doc! {"_id": {"$in": ids.to_vec()}}, None)
            .await
    }

    async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        self.find_many(ROOMS, doc! {}, None).await
    }

    async fn save_room(&self, room: &Room) -> StoreResult<()> {
        self.replace(ROOMS, room.id, room, &format!("Room {}", room.room_number))
            .await
    }

    async fn delete_room(&self, id: ObjectId) -> StoreResult<bool> {
        self.delete_by_id(ROOMS, id).await
    }
}

#[async_trait]
impl SessionRepository for MongoStore {
    async fn insert_session(&self, session: &MovieSession) -> StoreResult<()> {
        self.insert(SESSIONS, session, "A session for this room, date and time slot")
            .await
    }

    async fn find_session(&self, id: ObjectId) -> StoreResult<Option<MovieSession>> {
        self.find_by_id(SESSIONS, id).await
    }

    async fn find_session_by_slot(
        &self,
        date: NaiveDate,
        room_id: ObjectId,
        time_slot: TimeSlot,
    ) -> StoreResult<Option<MovieSession>> {
        self.collection::<MovieSession>(SESSIONS)
            .find_one(
                doc! {
                    "date": date.to_string(),
                    "room_id": room_id,
                    "time_slot": time_slot.as_str(),
                },
                None,
            )
            .await
            .map_err(backend)
    }

    async fn find_sessions(&self, filter: &SessionFilter) -> StoreResult<Vec<MovieSession>> {
        let options = FindOptions::builder()
            .sort(doc! {"date": 1, "time_slot": 1})
            .build();
        self.find_many(SESSIONS, session_query(filter), Some(options))
            .await
    }

    async fn save_session(&self, session: &MovieSession) -> StoreResult<()> {
        self.replace(
            SESSIONS,
            session.id,
            session,
            "A session for this room, date and time slot",
        )
        .await
    }

    async fn delete_sessions(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.delete_where(SESSIONS, doc! {"_id": {"$in": ids.to_vec()}})
            .await
    }
}

#[async_trait]
impl TicketRepository for MongoStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        self.insert(TICKETS, ticket, "Ticket").await
    }

    async fn find_ticket(&self, id: ObjectId) -> StoreResult<Option<Ticket>> {
        self.find_by_id(TICKETS, id).await
    }

    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        self.find_many(TICKETS, doc! {}, None).await
    }

    async fn find_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<Ticket>> {
        self.find_many(TICKETS, doc! {"user_id": user_id}, None)
            .await
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        self.replace(TICKETS, ticket.id, ticket, "Ticket").await
    }

    async fn delete_ticket(&self, id: ObjectId) -> StoreResult<bool> {
        self.delete_by_id(TICKETS, id).await
    }

    async fn delete_tickets_by_sessions(&self, session_ids: &[ObjectId]) -> StoreResult<u64> {
        if session_ids.is_empty() {
            return Ok(0);
        }
        self.delete_where(TICKETS, doc! {"session_id": {"$in": session_ids.to_vec()}})
            .await
    }

    async fn delete_tickets_by_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        self.delete_where(TICKETS, doc! {"user_id": user_id}).await
    }
}

#[async_trait]
impl WatchHistoryRepository for MongoStore {
    async fn insert_watch_entry(&self, entry: &WatchHistoryEntry) -> StoreResult<()> {
        self.insert(WATCH_HISTORY, entry, "Watch history entry")
            .await
    }

    async fn find_watch_history(&self, user_id: ObjectId) -> StoreResult<Vec<WatchHistoryEntry>> {
        let options = FindOptions::builder().sort(doc! {"watched_at": -1}).build();
        self.find_many(WATCH_HISTORY, doc! {"user_id": user_id}, Some(options))
            .await
    }

    async fn delete_watch_history_by_user(&self, user_id: ObjectId) -> StoreResult<u64> {
        self.delete_where(WATCH_HISTORY, doc! {"user_id": user_id})
            .await
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.insert(USERS, user, &format!("User with username: {}", user.username))
            .await
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        self.find_by_id(USERS, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.collection::<User>(USERS)
            .find_one(doc! {"username": username}, None)
            .await
            .map_err(backend)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.find_many(USERS, doc! {}, None).await
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.replace(
            USERS,
            user.id,
            user,
            &format!("User with username: {}", user.username),
        )
        .await
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool> {
        self.delete_by_id(USERS, id).await
    }
}
