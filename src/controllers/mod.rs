pub mod home_controller;
pub mod movie_controller;
pub mod room_controller;
pub mod session_controller;
pub mod ticket_controller;
pub mod user_controller;
