use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum LeaveStatus {
        Pending => "pending",
        ApprovedBySectionHead => "approved_by_section_head",
        ApprovedByKepalaUpt => "approved_by_kepala_upt",
        Rejected => "rejected",
    }
}

impl LeaveStatus {
    /// Fully approved and rejected requests accept no further decisions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveStatus::ApprovedByKepalaUpt | LeaveStatus::Rejected
        )
    }

    /// Statuses that count against the annual quota.
    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            LeaveStatus::ApprovedBySectionHead | LeaveStatus::ApprovedByKepalaUpt
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: i64,
    pub status: LeaveStatus,
    pub section_head_id: Option<Uuid>,
    pub section_head_approved_at: Option<DateTime<Utc>>,
    pub section_head_notes: Option<String>,
    pub kepala_upt_id: Option<Uuid>,
    pub kepala_upt_approved_at: Option<DateTime<Utc>>,
    pub kepala_upt_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveRequestInput {
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Validated fields for inserting a request; `days_requested` is fixed here
/// and never recomputed afterwards.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub user_id: Uuid,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: i64,
}

/// Inclusive day count of a leave span; a single-day request counts as one.
pub fn inclusive_day_span(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}
