use actix_web::web;

use crate::handlers::leave_requests;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave-requests")
            .route("", web::post().to(leave_requests::create_leave_request))
            .route("", web::get().to(leave_requests::list_leave_requests))
            .route("/{id}", web::get().to(leave_requests::get_leave_request))
            .route("/{id}", web::delete().to(leave_requests::delete_leave_request))
            .route(
                "/{id}/approve",
                web::post().to(leave_requests::approve_leave_request),
            )
            .route(
                "/{id}/reject",
                web::post().to(leave_requests::reject_leave_request),
            ),
    );
}
