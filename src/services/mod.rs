//! Business operations over the repository traits.
//!
//! The store has no foreign keys, so parent removals cascade here:
//! movie/room → sessions → tickets, and user → tickets + watch history.

use mongodb::bson::oid::ObjectId;

use crate::error::AppResult;
use crate::repositories::{SessionFilter, Store};

pub mod catalog;
pub mod identity;
pub mod scheduler;
pub mod ticketing;

pub use catalog::CatalogService;
pub use identity::IdentityService;
pub use scheduler::SessionScheduler;
pub use ticketing::TicketingService;

/// Deletes every session matching `filter` together with its tickets.
async fn purge_sessions(store: &dyn Store, filter: SessionFilter) -> AppResult<u64> {
    let ids: Vec<ObjectId> = store
        .find_sessions(&filter)
        .await?
        .into_iter()
        .map(|session| session.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }

    let tickets = store.delete_tickets_by_sessions(&ids).await?;
    let sessions = store.delete_sessions(&ids).await?;
    tracing::debug!(sessions, tickets, "cascaded session removal");
    Ok(sessions)
}
