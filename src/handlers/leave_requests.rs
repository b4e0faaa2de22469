use actix_web::{web, HttpResponse, Result};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::leave_request::inclusive_day_span;
use crate::database::models::{
    CreateLeaveRequestInput, LeaveRequest, NewLeaveRequest, Role, User,
};
use crate::database::repositories::{LeaveRequestRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::shared::{load_actor, ApiResponse, PageQuery, PagedResponse};
use crate::services::auth::Claims;
use crate::services::{policy, quota};

/// Stored when a request is rejected without an explanation; a rejection is
/// never left unexplained.
pub const DEFAULT_REJECTION_NOTE: &str = "Permintaan ditolak.";

#[derive(Debug, Deserialize)]
pub struct DecisionInput {
    pub notes: Option<String>,
}

/// Requester ids visible to the actor, or `None` for unrestricted visibility.
async fn visible_requester_ids(
    actor: &User,
    user_repo: &UserRepository,
) -> Result<Option<Vec<Uuid>>, AppError> {
    let ids = match actor.role {
        Role::UnitHead => None,
        Role::SectionHead(_) => {
            let mut ids: Vec<Uuid> = user_repo
                .subordinates_of(actor.id)
                .await
                .map_err(AppError::from)?
                .into_iter()
                .map(|u| u.id)
                .collect();
            ids.push(actor.id);
            Some(ids)
        }
        Role::Staff(_) => Some(vec![actor.id]),
    };

    Ok(ids)
}

pub async fn list_leave_requests(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (page, per_page, offset) = query.limits();

    let requester_ids = visible_requester_ids(&actor, &user_repo).await?;

    let total = leave_repo
        .count(requester_ids.as_deref())
        .await
        .map_err(AppError::from)?;
    let requests = leave_repo
        .list(requester_ids.as_deref(), per_page, offset)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PagedResponse {
        data: requests,
        page,
        per_page,
        total,
    })))
}

pub async fn create_leave_request(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    input: web::Json<CreateLeaveRequestInput>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;

    if !policy::can_submit_request(&actor) {
        return Err(AppError::Forbidden(
            "Only staff and section heads may submit leave requests".to_string(),
        )
        .into());
    }

    let input = input.into_inner();
    validate_leave_input(&input)?;

    let days_requested = inclusive_day_span(input.start_date, input.end_date);

    // Quota is checked against the current year, regardless of when the
    // leave starts.
    let year = Utc::now().year();
    let remaining = quota::remaining_quota(&leave_repo, &actor, year)
        .await
        .map_err(AppError::from)?;

    if days_requested > remaining {
        return Err(AppError::QuotaExceeded {
            requested: days_requested,
            remaining,
        }
        .into());
    }

    let request = leave_repo
        .create_request(NewLeaveRequest {
            user_id: actor.id,
            reason: input.reason,
            start_date: input.start_date,
            end_date: input.end_date,
            days_requested,
        })
        .await
        .map_err(AppError::from)?;

    log::info!(
        "Leave request {} created by {} for {} day(s)",
        request.id,
        actor.username,
        days_requested
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(request)))
}

fn validate_leave_input(input: &CreateLeaveRequestInput) -> Result<(), AppError> {
    let reason_len = input.reason.chars().count();
    if reason_len < 10 {
        return Err(AppError::Validation(
            "Reason must be at least 10 characters".to_string(),
        ));
    }
    if reason_len > 500 {
        return Err(AppError::Validation(
            "Reason must be at most 500 characters".to_string(),
        ));
    }
    if input.start_date < Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Start date must not be in the past".to_string(),
        ));
    }
    if input.end_date < input.start_date {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }

    Ok(())
}

/// Load a request together with its requester, or 404.
async fn load_request_pair(
    id: Uuid,
    user_repo: &UserRepository,
    leave_repo: &LeaveRequestRepository,
) -> Result<(LeaveRequest, User), AppError> {
    let request = leave_repo
        .find_by_id(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

    let requester = user_repo
        .find_by_id(request.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Requester not found".to_string()))?;

    Ok((request, requester))
}

pub async fn get_leave_request(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (request, requester) = load_request_pair(path.into_inner(), &user_repo, &leave_repo).await?;

    if !policy::can_view_request(&actor, &requester, &request) {
        return Err(AppError::Forbidden("Cannot view this leave request".to_string()).into());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(request)))
}

pub async fn approve_leave_request(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    path: web::Path<Uuid>,
    input: web::Json<DecisionInput>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (request, requester) = load_request_pair(path.into_inner(), &user_repo, &leave_repo).await?;

    if !policy::can_decide_request(&actor, &requester, &request) {
        return Err(AppError::Forbidden("You may not approve this request".to_string()).into());
    }

    let notes = input.into_inner().notes;
    let updated = match actor.role {
        Role::SectionHead(_) => leave_repo
            .approve_by_section_head(request.id, actor.id, notes)
            .await
            .map_err(AppError::from)?,
        Role::UnitHead => leave_repo
            .approve_by_unit_head(request.id, actor.id, notes)
            .await
            .map_err(AppError::from)?,
        Role::Staff(_) => {
            return Err(
                AppError::Forbidden("You may not approve this request".to_string()).into(),
            );
        }
    };

    log::info!(
        "Leave request {} approved by {} ({})",
        updated.id,
        actor.username,
        actor.role.as_str()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn reject_leave_request(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    path: web::Path<Uuid>,
    input: web::Json<DecisionInput>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (request, requester) = load_request_pair(path.into_inner(), &user_repo, &leave_repo).await?;

    // Same eligibility predicate as approval; only the transition differs.
    if !policy::can_decide_request(&actor, &requester, &request) {
        return Err(AppError::Forbidden("You may not reject this request".to_string()).into());
    }

    let notes = input
        .into_inner()
        .notes
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION_NOTE.to_string());

    let updated = match actor.role {
        Role::SectionHead(_) => leave_repo
            .reject_by_section_head(request.id, actor.id, notes)
            .await
            .map_err(AppError::from)?,
        Role::UnitHead => leave_repo
            .reject_by_unit_head(request.id, actor.id, notes)
            .await
            .map_err(AppError::from)?,
        Role::Staff(_) => {
            return Err(
                AppError::Forbidden("You may not reject this request".to_string()).into(),
            );
        }
    };

    log::info!(
        "Leave request {} rejected by {} ({})",
        updated.id,
        actor.username,
        actor.role.as_str()
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

pub async fn delete_leave_request(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (request, requester) = load_request_pair(path.into_inner(), &user_repo, &leave_repo).await?;

    if !policy::can_delete_request(&actor, &requester, &request) {
        return Err(AppError::Forbidden("Cannot delete this leave request".to_string()).into());
    }

    leave_repo
        .delete_request(request.id)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::NoContent().finish())
}
