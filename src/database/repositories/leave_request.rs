use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{LeaveRequest, LeaveStatus, NewLeaveRequest};

const LEAVE_COLUMNS: &str = r#"
    id,
    user_id,
    reason,
    start_date,
    end_date,
    days_requested,
    status,
    section_head_id,
    section_head_approved_at,
    section_head_notes,
    kepala_upt_id,
    kepala_upt_approved_at,
    kepala_upt_notes,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct LeaveRequestRepository {
    pool: SqlitePool,
}

impl LeaveRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new request in `pending` status.
    pub async fn create_request(&self, input: NewLeaveRequest) -> Result<LeaveRequest> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO
                leave_requests (
                    id,
                    user_id,
                    reason,
                    start_date,
                    end_date,
                    days_requested,
                    status,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {LEAVE_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_id)
            .bind(&input.reason)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.days_requested)
            .bind(LeaveStatus::Pending)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        let query = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    /// List requests newest first, optionally restricted to a set of
    /// requesters. `None` means no restriction (unit-head visibility).
    pub async fn list(
        &self,
        requester_ids: Option<&[Uuid]>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaveRequest>> {
        let mut query = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests");

        if let Some(ids) = requester_ids {
            let placeholders = vec!["?"; ids.len().max(1)].join(", ");
            query.push_str(&format!(" WHERE user_id IN ({placeholders})"));
        }

        query.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut prepared = sqlx::query_as::<_, LeaveRequest>(&query);
        if let Some(ids) = requester_ids {
            if ids.is_empty() {
                // IN () is not valid SQL; bind a nil id that matches nothing.
                prepared = prepared.bind(Uuid::nil());
            }
            for id in ids {
                prepared = prepared.bind(*id);
            }
        }

        let requests = prepared
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    pub async fn count(&self, requester_ids: Option<&[Uuid]>) -> Result<i64> {
        let mut query = "SELECT COUNT(*) FROM leave_requests".to_string();

        if let Some(ids) = requester_ids {
            let placeholders = vec!["?"; ids.len().max(1)].join(", ");
            query.push_str(&format!(" WHERE user_id IN ({placeholders})"));
        }

        let mut prepared = sqlx::query_scalar::<_, i64>(&query);
        if let Some(ids) = requester_ids {
            if ids.is_empty() {
                prepared = prepared.bind(Uuid::nil());
            }
            for id in ids {
                prepared = prepared.bind(*id);
            }
        }

        let count = prepared.fetch_one(&self.pool).await?;

        Ok(count)
    }

    /// Sum of approved leave days whose start date falls in the given year.
    /// A request spanning a year boundary counts entirely against the year it
    /// starts in; this mirrors the quota rule the rest of the system uses.
    pub async fn approved_days_in_year(&self, user_id: Uuid, year: i32) -> Result<i64> {
        let used: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(days_requested), 0)
            FROM leave_requests
            WHERE
                user_id = ?
                AND status IN ('approved_by_section_head', 'approved_by_kepala_upt')
                AND CAST(strftime('%Y', start_date) AS INTEGER) = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        Ok(used)
    }

    /// First approval stage: pending → approved_by_section_head.
    pub async fn approve_by_section_head(
        &self,
        id: Uuid,
        approver_id: Uuid,
        notes: Option<String>,
    ) -> Result<LeaveRequest> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE leave_requests
            SET
                status = ?,
                section_head_id = ?,
                section_head_approved_at = ?,
                section_head_notes = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(LeaveStatus::ApprovedBySectionHead)
            .bind(approver_id)
            .bind(now)
            .bind(notes)
            .bind(now)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    /// Final approval stage: pending or approved_by_section_head →
    /// approved_by_kepala_upt.
    pub async fn approve_by_unit_head(
        &self,
        id: Uuid,
        approver_id: Uuid,
        notes: Option<String>,
    ) -> Result<LeaveRequest> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE leave_requests
            SET
                status = ?,
                kepala_upt_id = ?,
                kepala_upt_approved_at = ?,
                kepala_upt_notes = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(LeaveStatus::ApprovedByKepalaUpt)
            .bind(approver_id)
            .bind(now)
            .bind(notes)
            .bind(now)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    /// Rejection by a section head; the decision lands in the section-head
    /// metadata fields.
    pub async fn reject_by_section_head(
        &self,
        id: Uuid,
        approver_id: Uuid,
        notes: String,
    ) -> Result<LeaveRequest> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE leave_requests
            SET
                status = ?,
                section_head_id = ?,
                section_head_approved_at = ?,
                section_head_notes = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(LeaveStatus::Rejected)
            .bind(approver_id)
            .bind(now)
            .bind(notes)
            .bind(now)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    /// Rejection by the unit head; the decision lands in the unit-head
    /// metadata fields.
    pub async fn reject_by_unit_head(
        &self,
        id: Uuid,
        approver_id: Uuid,
        notes: String,
    ) -> Result<LeaveRequest> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE leave_requests
            SET
                status = ?,
                kepala_upt_id = ?,
                kepala_upt_approved_at = ?,
                kepala_upt_notes = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        );

        let request = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(LeaveStatus::Rejected)
            .bind(approver_id)
            .bind(now)
            .bind(notes)
            .bind(now)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    pub async fn delete_request(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
