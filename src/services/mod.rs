pub mod auth;
pub mod policy;
pub mod quota;

pub use auth::AuthService;
