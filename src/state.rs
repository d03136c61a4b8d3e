use std::sync::Arc;

use crate::auth::token::TokenIssuer;
use crate::repositories::Store;
use crate::services::{CatalogService, IdentityService, SessionScheduler, TicketingService};

/// Shared handler state. Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub scheduler: SessionScheduler,
    pub ticketing: TicketingService,
    pub identity: IdentityService,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer) -> Self {
        let tokens = Arc::new(tokens);
        let catalog = CatalogService::new(store.clone());
        let scheduler = SessionScheduler::new(store.clone(), catalog.clone());
        let identity = IdentityService::new(store.clone(), tokens.clone());
        let ticketing = TicketingService::new(store, scheduler.clone(), identity.clone());

        AppState {
            catalog,
            scheduler,
            ticketing,
            identity,
            tokens,
        }
    }
}
