use std::sync::Arc;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::ticket_model::{Ticket, TicketDetail, WatchHistoryEntry};
use crate::models::user_model::Principal;
use crate::repositories::{Store, StoreError};

use super::{IdentityService, SessionScheduler};

/// Ticket purchase, redemption and the watch-history ledger.
#[derive(Clone)]
pub struct TicketingService {
    store: Arc<dyn Store>,
    scheduler: SessionScheduler,
    identity: IdentityService,
}

impl TicketingService {
    pub fn new(store: Arc<dyn Store>, scheduler: SessionScheduler, identity: IdentityService) -> Self {
        TicketingService {
            store,
            scheduler,
            identity,
        }
    }

    pub async fn create_ticket(
        &self,
        session_id: ObjectId,
        buyer: &Principal,
    ) -> AppResult<TicketDetail> {
        let session = self.scheduler.find_session(session_id).await?;
        let user = self.identity.find_user(buyer.id).await?;

        let ticket = Ticket {
            id: ObjectId::new(),
            user_id: user.id,
            session_id: session.session.id,
            purchase_date: Utc::now(),
            used: false,
        };
        self.store.insert_ticket(&ticket).await?;
        tracing::info!(ticket_id = %ticket.id, user = %user.username, session_id = %session_id, "ticket purchased");
        Ok(TicketDetail {
            ticket,
            session: Some(session),
        })
    }

    pub async fn mark_used(&self, ticket_id: ObjectId, requester: &Principal) -> AppResult<TicketDetail> {
        self.mark_used_at(ticket_id, requester, Utc::now()).await
    }

    /// Redeems the ticket if `now` falls inside its session's slot window.
    /// Redeeming an already used ticket returns it unchanged.
    pub async fn mark_used_at(
        &self,
        ticket_id: ObjectId,
        requester: &Principal,
        now: DateTime<Utc>,
    ) -> AppResult<TicketDetail> {
        let mut ticket = self.find_ticket_record(ticket_id).await?;
        let session = self.scheduler.find_session(ticket.session_id).await?;

        if ticket.user_id != requester.id {
            return Err(AppError::Forbidden(
                "You can only use your own tickets".to_string(),
            ));
        }
        let slot = session.session.time_slot;
        if !slot.contains(session.session.date, now) {
            return Err(AppError::BadRequest(format!(
                "Ticket can only be used on {} during {}",
                session.session.date, slot
            )));
        }
        if ticket.used {
            return Ok(TicketDetail {
                ticket,
                session: Some(session),
            });
        }

        // Keyed by the ticket id; a retried redemption hits the same row.
        let entry = WatchHistoryEntry {
            id: ticket.id,
            user_id: ticket.user_id,
            movie: session.movie.name.clone(),
            time_slot: slot,
            watched_at: session.session.date,
        };
        match self.store.insert_watch_entry(&entry).await {
            Ok(()) | Err(StoreError::Duplicate(_)) => {}
            Err(err) => return Err(err.into()),
        }
        ticket.used = true;
        self.store.save_ticket(&ticket).await?;
        tracing::info!(ticket_id = %ticket.id, movie = %entry.movie, "ticket used");

        Ok(TicketDetail {
            ticket,
            session: Some(session),
        })
    }

    pub async fn refund(&self, ticket_id: ObjectId) -> AppResult<()> {
        let ticket = self.find_ticket_record(ticket_id).await?;
        self.store.delete_ticket(ticket.id).await?;
        tracing::info!(ticket_id = %ticket.id, "ticket refunded");
        Ok(())
    }

    pub async fn find_ticket(&self, ticket_id: ObjectId) -> AppResult<TicketDetail> {
        let ticket = self.find_ticket_record(ticket_id).await?;
        let session = self.scheduler.find_session(ticket.session_id).await?;
        Ok(TicketDetail {
            ticket,
            session: Some(session),
        })
    }

    pub async fn list_user_tickets(&self, principal: &Principal) -> AppResult<Vec<TicketDetail>> {
        let user = self.identity.find_user(principal.id).await?;
        let tickets = self.store.find_tickets_by_user(user.id).await?;

        let mut details = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let session = match self.scheduler.find_session(ticket.session_id).await {
                Ok(session) => Some(session),
                Err(AppError::NotFound(_)) => None,
                Err(err) => return Err(err),
            };
            details.push(TicketDetail { ticket, session });
        }
        Ok(details)
    }

    pub async fn list_watch_history(&self, principal: &Principal) -> AppResult<Vec<WatchHistoryEntry>> {
        let user = self.identity.find_user(principal.id).await?;
        Ok(self.store.find_watch_history(user.id).await?)
    }

    pub async fn list_all_tickets(&self) -> AppResult<Vec<Ticket>> {
        Ok(self.store.list_tickets().await?)
    }

    async fn find_ticket_record(&self, id: ObjectId) -> AppResult<Ticket> {
        self.store
            .find_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cannot find ticket with ID: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::models::movie_model::CreateMovie;
    use crate::models::room_model::CreateRoom;
    use crate::models::session_model::TimeSlot;
    use crate::models::user_model::{SignUp, User};
    use crate::repositories::TicketRepository;
    use crate::services::fixtures::{date, harness, principal, Harness};

    struct World {
        h: Harness,
        owner: User,
        stranger: User,
        session_id: ObjectId,
        day: NaiveDate,
    }

    async fn world(slot: TimeSlot) -> World {
        let h = harness();
        let movie = h
            .catalog
            .create_movie(CreateMovie {
                name: "Inception".into(),
                age_restriction: 13,
            })
            .await
            .unwrap();
        let room = h
            .catalog
            .create_room(CreateRoom {
                room_number: "Room 101".into(),
                capacity: Some(50),
            })
            .await
            .unwrap();
        let day = date(2030, 3, 14);
        let session = h
            .scheduler
            .create_session(day, room.id, slot, movie.id)
            .await
            .unwrap();
        let owner = h
            .identity
            .sign_up(SignUp {
                username: "jane".into(),
                password: "secret-pass".into(),
                age: 30,
            })
            .await
            .unwrap();
        let stranger = h
            .identity
            .sign_up(SignUp {
                username: "john".into(),
                password: "secret-pass".into(),
                age: 30,
            })
            .await
            .unwrap();
        World {
            h,
            owner,
            stranger,
            session_id: session.session.id,
            day,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[tokio::test]
    async fn purchase_creates_an_unused_ticket() {
        let w = world(TimeSlot::Slot1).await;
        let ticket = w
            .h
            .ticketing
            .create_ticket(w.session_id, &principal(&w.owner))
            .await
            .unwrap();
        assert!(!ticket.ticket.used);
        assert_eq!(ticket.ticket.user_id, w.owner.id);
        assert_eq!(ticket.session.unwrap().movie.name, "Inception");
    }

    #[tokio::test]
    async fn purchase_for_unknown_session_is_not_found() {
        let w = world(TimeSlot::Slot1).await;
        let result = w
            .h
            .ticketing
            .create_ticket(ObjectId::new(), &principal(&w.owner))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn redemption_inside_window_records_history_once() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();
        let now = at(2030, 3, 14, 11, 0);

        let first = w
            .h
            .ticketing
            .mark_used_at(ticket.ticket.id, &owner, now)
            .await
            .unwrap();
        let second = w
            .h
            .ticketing
            .mark_used_at(ticket.ticket.id, &owner, now)
            .await
            .unwrap();

        assert!(first.ticket.used);
        assert!(second.ticket.used);
        assert_eq!(w.h.store.watch_history_len().await, 1);

        let history = w.h.ticketing.list_watch_history(&owner).await.unwrap();
        assert_eq!(history[0].movie, "Inception");
        assert_eq!(history[0].time_slot, TimeSlot::Slot1);
        assert_eq!(history[0].watched_at, w.day);
    }

    #[tokio::test]
    async fn redemption_outside_window_is_rejected() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();

        for now in [at(2030, 3, 14, 9, 59), at(2030, 3, 14, 12, 1), at(2030, 3, 15, 11, 0)] {
            let result = w.h.ticketing.mark_used_at(ticket.ticket.id, &owner, now).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))), "at {now}");
        }
        assert_eq!(w.h.store.watch_history_len().await, 0);
        let stored = w.h.store.find_ticket(ticket.ticket.id).await.unwrap().unwrap();
        assert!(!stored.used);
    }

    #[tokio::test]
    async fn last_slot_is_redeemable_until_midnight() {
        let w = world(TimeSlot::Slot7).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();

        let used = w
            .h
            .ticketing
            .mark_used_at(ticket.ticket.id, &owner, at(2030, 3, 14, 23, 30))
            .await
            .unwrap();
        assert!(used.ticket.used);
    }

    #[tokio::test]
    async fn only_the_owner_can_redeem() {
        let w = world(TimeSlot::Slot1).await;
        let ticket = w
            .h
            .ticketing
            .create_ticket(w.session_id, &principal(&w.owner))
            .await
            .unwrap();

        let result = w
            .h
            .ticketing
            .mark_used_at(ticket.ticket.id, &principal(&w.stranger), at(2030, 3, 14, 11, 0))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn refund_deletes_the_ticket() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();

        w.h.ticketing.refund(ticket.ticket.id).await.unwrap();

        assert!(matches!(
            w.h.ticketing.find_ticket(ticket.ticket.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            w.h.ticketing.refund(ticket.ticket.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_tickets_are_scoped_and_populated() {
        let w = world(TimeSlot::Slot2).await;
        let owner = principal(&w.owner);
        w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();
        w.h.ticketing
            .create_ticket(w.session_id, &principal(&w.stranger))
            .await
            .unwrap();

        let mine = w.h.ticketing.list_user_tickets(&owner).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].session.as_ref().unwrap().room.room_number, "Room 101");
        assert_eq!(w.h.ticketing.list_all_tickets().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn removing_a_session_or_user_cascades() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();
        w.h.ticketing
            .mark_used_at(ticket.ticket.id, &owner, at(2030, 3, 14, 10, 0))
            .await
            .unwrap();
        w.h.ticketing
            .create_ticket(w.session_id, &principal(&w.stranger))
            .await
            .unwrap();

        w.h.identity.remove_user(w.owner.id).await.unwrap();
        assert_eq!(w.h.store.watch_history_len().await, 0);
        assert_eq!(w.h.ticketing.list_all_tickets().await.unwrap().len(), 1);

        w.h.scheduler.remove_session(w.session_id).await.unwrap();
        assert!(w.h.ticketing.list_all_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_history_write_leaves_ticket_redeemable() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();
        let now = at(2030, 3, 14, 11, 0);

        w.h.store.fail_next_watch_insert();
        let first = w.h.ticketing.mark_used_at(ticket.ticket.id, &owner, now).await;
        assert!(matches!(first, Err(AppError::Internal(_))));
        let stored = w.h.store.find_ticket(ticket.ticket.id).await.unwrap().unwrap();
        assert!(!stored.used);

        let retried = w
            .h
            .ticketing
            .mark_used_at(ticket.ticket.id, &owner, now)
            .await
            .unwrap();
        assert!(retried.ticket.used);
        assert_eq!(w.h.store.watch_history_len().await, 1);
    }

    #[tokio::test]
    async fn failed_ticket_save_does_not_duplicate_history_on_retry() {
        let w = world(TimeSlot::Slot1).await;
        let owner = principal(&w.owner);
        let ticket = w.h.ticketing.create_ticket(w.session_id, &owner).await.unwrap();
        let now = at(2030, 3, 14, 11, 0);

        w.h.store.fail_next_ticket_save();
        let first = w.h.ticketing.mark_used_at(ticket.ticket.id, &owner, now).await;
        assert!(matches!(first, Err(AppError::Internal(_))));

        w.h.ticketing
            .mark_used_at(ticket.ticket.id, &owner, now)
            .await
            .unwrap();
        let stored = w.h.store.find_ticket(ticket.ticket.id).await.unwrap().unwrap();
        assert!(stored.used);
        assert_eq!(w.h.store.watch_history_len().await, 1);
    }
}
