pub mod auth;
pub mod leave_requests;
pub mod shared;
pub mod users;
