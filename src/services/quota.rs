//! Remaining annual-leave balance.
//!
//! The balance is derived on every call from the approved requests of the
//! year, never stored, so it always reflects the current approval state.

use anyhow::Result;

use crate::database::models::User;
use crate::database::repositories::LeaveRequestRepository;

/// Pure remainder rule: over-approval floors at zero, never negative.
pub fn remaining(annual_quota: i64, used_days: i64) -> i64 {
    (annual_quota - used_days).max(0)
}

/// Remaining quota for `user` in `year`, counting requests approved at either
/// stage. Requests are attributed to the year their start date falls in.
pub async fn remaining_quota(
    leave_requests: &LeaveRequestRepository,
    user: &User,
    year: i32,
) -> Result<i64> {
    let used = leave_requests.approved_days_in_year(user.id, year).await?;
    Ok(remaining(user.annual_leave_quota, used))
}
