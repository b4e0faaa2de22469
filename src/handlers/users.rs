use actix_web::{web, HttpResponse, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Datelike;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{
    CreateUserInput, Role, UpdateUserInput, User, UserInfo,
};
use crate::database::repositories::{LeaveRequestRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::shared::{load_actor, ApiResponse, PageQuery, PagedResponse};
use crate::services::auth::Claims;
use crate::services::{policy, quota};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub user: UserInfo,
    pub remaining_quota: i64,
}

pub async fn list_users(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let (page, per_page, offset) = query.limits();

    let (users, total) = match actor.role {
        Role::UnitHead => {
            let total = user_repo.count_all().await.map_err(AppError::from)?;
            let users = user_repo
                .list_all(per_page, offset)
                .await
                .map_err(AppError::from)?;
            (users, total)
        }
        Role::SectionHead(section) => {
            let total = user_repo
                .count_staff_in_section(section)
                .await
                .map_err(AppError::from)?;
            let users = user_repo
                .list_staff_in_section(section, per_page, offset)
                .await
                .map_err(AppError::from)?;
            (users, total)
        }
        Role::Staff(_) => {
            return Err(
                AppError::Forbidden("User management requires an approver role".to_string())
                    .into(),
            );
        }
    };

    let data: Vec<UserInfo> = users.into_iter().map(UserInfo::from).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(PagedResponse {
        data,
        page,
        per_page,
        total,
    })))
}

pub async fn create_user(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    input: web::Json<CreateUserInput>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let input = input.into_inner();

    let role = Role::from_columns(&input.role, input.section).map_err(AppError::Validation)?;

    if !policy::can_create_user(&actor, &role) {
        return Err(AppError::Forbidden(
            "You may not create a user with this role and section".to_string(),
        )
        .into());
    }

    validate_new_user(&input)?;

    if user_repo
        .username_exists(&input.username)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::Validation("Username is already taken".to_string()).into());
    }
    if user_repo.nip_exists(&input.nip).await.map_err(AppError::from)? {
        return Err(AppError::Validation("NIP is already registered".to_string()).into());
    }

    let supervisor_id = user_repo
        .derive_supervisor_id(&role)
        .await
        .map_err(AppError::from)?;

    let password_hash = hash(&input.password, DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(Some(e.to_string())))?;

    let user = User::new(crate::database::models::NewUser {
        username: input.username,
        full_name: input.full_name,
        nip: input.nip,
        position: input.position,
        gender: input.gender,
        phone: input.phone,
        role,
        supervisor_id,
        password_hash,
    });

    let created = user_repo.create_user(&user).await.map_err(AppError::from)?;

    log::info!(
        "User {} ({}) created by {}",
        created.username,
        created.role.as_str(),
        actor.username
    );

    Ok(HttpResponse::Created().json(ApiResponse::success(UserInfo::from(created))))
}

fn validate_new_user(input: &CreateUserInput) -> Result<(), AppError> {
    if input.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if input.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    if input.position.trim().is_empty() {
        return Err(AppError::Validation("Position is required".to_string()));
    }
    if input.nip.len() != 16 || !input.nip.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "NIP must be exactly 16 digits".to_string(),
        ));
    }
    if input.password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    Ok(())
}

async fn load_target(id: Uuid, user_repo: &UserRepository) -> Result<User, AppError> {
    user_repo
        .find_by_id(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn get_user(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    leave_repo: web::Data<LeaveRequestRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let target = load_target(path.into_inner(), &user_repo).await?;

    if !policy::can_view_user(&actor, &target) {
        return Err(AppError::Forbidden("Cannot view this user".to_string()).into());
    }

    let year = chrono::Utc::now().year();
    let remaining_quota = quota::remaining_quota(&leave_repo, &target, year)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserDetailResponse {
        user: target.into(),
        remaining_quota,
    })))
}

pub async fn update_user(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    path: web::Path<Uuid>,
    input: web::Json<UpdateUserInput>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let target = load_target(path.into_inner(), &user_repo).await?;

    if !policy::can_edit_user(&actor, &target) {
        return Err(AppError::Forbidden("Cannot edit this user".to_string()).into());
    }

    let input = input.into_inner();
    if input.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()).into());
    }
    if input.position.trim().is_empty() {
        return Err(AppError::Validation("Position is required".to_string()).into());
    }
    if let Some(quota) = input.annual_leave_quota {
        if quota < 0 {
            return Err(
                AppError::Validation("Annual leave quota must not be negative".to_string())
                    .into(),
            );
        }
    }

    let updated = user_repo
        .update_profile(target.id, &input)
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UserInfo::from(updated))))
}

pub async fn delete_user(
    claims: Claims,
    user_repo: web::Data<UserRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let actor = load_actor(&claims, &user_repo).await?;
    let target = load_target(path.into_inner(), &user_repo).await?;

    if !policy::can_delete_user(&actor, &target) {
        return Err(AppError::Forbidden("Cannot delete this user".to_string()).into());
    }

    user_repo
        .delete_user(target.id)
        .await
        .map_err(AppError::from)?;

    log::info!("User {} deleted by {}", target.username, actor.username);

    Ok(HttpResponse::NoContent().finish())
}
