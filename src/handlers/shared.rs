use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::services::auth::Claims;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    // Success with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

}

impl ApiResponse<()> {
    // Error response (no data)
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Paginated list envelope; the caller drives page/perPage, newest first.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn limits(&self) -> (i64, i64, i64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page, (page - 1) * per_page)
    }
}

/// The acting user is always loaded fresh from the directory; a token whose
/// account no longer exists is treated as unauthorized.
pub async fn load_actor(claims: &Claims, users: &UserRepository) -> Result<User, AppError> {
    users
        .find_by_id(claims.user_id())
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::Unauthorized)
}
