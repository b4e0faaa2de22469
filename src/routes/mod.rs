use actix_web::web;

pub mod auth;
pub mod leave_requests;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(auth::configure)
            .configure(leave_requests::configure)
            .configure(users::configure),
    );
}
