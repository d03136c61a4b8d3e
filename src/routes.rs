use axum::{
    http::{Method, Uri},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::controllers::{
    home_controller, movie_controller::*, room_controller::*, session_controller::*,
    ticket_controller::*, user_controller::*,
};
use crate::error::{attach_request_path, AppError};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_controller::index))
        .route("/movies", get(load_movies))
        .route("/movies/create", post(add_movie))
        .route("/movies/bulk-create", post(add_movies))
        .route("/movies/in-theatres", get(load_movies_in_theatres))
        .route("/movies/bulk-remove", delete(delete_movies))
        .route(
            "/movies/:id",
            get(load_movie).patch(update_movie).delete(delete_movie),
        )
        .route("/rooms", get(load_rooms))
        .route("/rooms/create", post(add_room))
        .route(
            "/rooms/:id",
            get(load_room).patch(update_room).delete(delete_room),
        )
        .route("/sessions", get(load_sessions))
        .route("/sessions/create", post(add_session))
        .route("/sessions/movie/:movie_id", get(load_sessions_by_movie))
        .route(
            "/sessions/:id",
            get(load_session).patch(update_session).delete(delete_session),
        )
        .route("/tickets", get(load_tickets))
        .route("/tickets/buy", post(buy_ticket))
        .route("/tickets/use/:id", patch(use_ticket))
        .route("/tickets/refund/:id", delete(refund_ticket))
        .route("/tickets/watch-history", get(load_watch_history))
        .route("/tickets/my-tickets", get(load_my_tickets))
        .route("/tickets/:id", get(load_ticket))
        .route("/users", get(load_users))
        .route("/users/signup", post(sign_up))
        .route("/users/signin", post(sign_in))
        .route("/users/create-user", post(add_user))
        .route("/users/my-profile", get(load_my_profile))
        .route("/users/update-profile", patch(update_profile))
        .route("/users/change-password", patch(change_password))
        .route("/users/:id", get(load_user).delete(delete_user))
        // Only covers routes registered above.
        .method_not_allowed_fallback(unsupported_method)
        .fallback(unknown_route)
        .with_state(state)
        .layer(middleware::from_fn(attach_request_path))
        .layer(TraceLayer::new_for_http())
}

async fn unknown_route(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {method} {}", uri.path()))
}

async fn unsupported_method(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("Cannot {method} {}", uri.path()))
}
