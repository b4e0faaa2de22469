use actix_web::{web, HttpResponse, Result};
use chrono::Datelike;
use serde::Serialize;

use crate::database::models::{LoginInput, UserInfo};
use crate::database::repositories::{LeaveRequestRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::shared::{load_actor, ApiResponse};
use crate::services::auth::Claims;
use crate::services::quota;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserInfo,
    pub remaining_quota: i64,
}

pub async fn login(
    app_state: web::Data<AppState>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse> {
    match app_state.auth_service.login(input.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(err) => {
            log::warn!("Login failed: {}", err);
            Err(AppError::Unauthorized.into())
        }
    }
}

/// Current user plus the leave balance of the running year.
pub async fn me(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;

    let year = chrono::Utc::now().year();
    let remaining_quota = quota::remaining_quota(&leave_repo, &actor, year)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(MeResponse {
        user: actor.into(),
        remaining_quota,
    })))
}
