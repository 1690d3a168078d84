pub mod auth;
pub mod students;
pub mod users;
