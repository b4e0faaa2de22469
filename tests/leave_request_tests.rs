use actix_web::{http::StatusCode, test, App};
use chrono::{Datelike, Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use cuti_be::database::models::{LeaveStatus, NewLeaveRequest, Section};
use cuti_be::routes;
use cuti_be::services::quota;

mod common;

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.app_state())
                .app_data($ctx.user_repo_data())
                .app_data($ctx.leave_repo_data())
                .app_data($ctx.config_data())
                .configure(routes::configure),
        )
        .await
    };
}

fn date_str(offset_days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(offset_days))
        .format("%Y-%m-%d")
        .to_string()
}

#[actix_web::test]
#[serial]
async fn test_two_stage_approval_flow() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;

    // Staff submits a five-day request
    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&staff))))
        .set_json(json!({
            "reason": "Taking annual leave for a family event",
            "startDate": date_str(0),
            "endDate": date_str(4),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["daysRequested"], 5);
    let request_id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();

    // Section head approves: first stage
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave-requests/{}/approve", request_id))
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&head))))
        .set_json(json!({ "notes": "Approved, enjoy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = ctx.leave_repo.find_by_id(request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::ApprovedBySectionHead);
    assert_eq!(stored.section_head_id, Some(head.id));
    assert!(stored.section_head_approved_at.is_some());
    assert_eq!(stored.section_head_notes.as_deref(), Some("Approved, enjoy"));

    // Unit head approves: final stage
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave-requests/{}/approve", request_id))
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&unit_head)),
        ))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = ctx.leave_repo.find_by_id(request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::ApprovedByKepalaUpt);
    assert_eq!(stored.kepala_upt_id, Some(unit_head.id));
    assert!(stored.kepala_upt_approved_at.is_some());

    // Five approved days leave seven of the default twelve
    let year = Utc::now().year();
    let remaining = quota::remaining_quota(&ctx.leave_repo, &staff, year)
        .await
        .unwrap();
    assert_eq!(remaining, 7);
}

#[actix_web::test]
#[serial]
async fn test_unit_head_approves_directly_from_pending() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::B, &unit_head).await;
    let staff = ctx.seed_staff("sari", Section::B, &head).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Urgent family matter out of town".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(1),
            days_requested: 2,
        })
        .await
        .unwrap();

    // The section-head stage may be skipped entirely
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave-requests/{}/approve", request.id))
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&unit_head)),
        ))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = ctx.leave_repo.find_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::ApprovedByKepalaUpt);
    assert_eq!(stored.section_head_id, None);
}

#[actix_web::test]
#[serial]
async fn test_submit_fails_when_quota_exceeded() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;

    // Ten days already approved this year
    let existing = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Long holiday already granted earlier".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(9),
            days_requested: 10,
        })
        .await
        .unwrap();
    ctx.leave_repo
        .approve_by_section_head(existing.id, head.id, None)
        .await
        .unwrap();

    // An eight-day request no longer fits
    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&staff))))
        .set_json(json!({
            "reason": "Another long holiday this same year",
            "startDate": date_str(30),
            "endDate": date_str(37),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // No record was created
    let total = ctx.leave_repo.count(Some(&[staff.id])).await.unwrap();
    assert_eq!(total, 1);
}

#[actix_web::test]
#[serial]
async fn test_section_head_cannot_approve_other_section() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head_a = ctx.seed_section_head(Section::A, &unit_head).await;
    let head_b = ctx.seed_section_head(Section::B, &unit_head).await;
    let staff_b = ctx.seed_staff("sari", Section::B, &head_b).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff_b.id,
            reason: "Attending a wedding out of province".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(2),
            days_requested: 3,
        })
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave-requests/{}/approve", request.id))
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&head_a))))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = ctx.leave_repo.find_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::Pending);
}

#[actix_web::test]
#[serial]
async fn test_reject_without_notes_uses_default_text() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::C, &unit_head).await;
    let staff = ctx.seed_staff("agus", Section::C, &head).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Personal errand that takes a few days".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(2),
            days_requested: 3,
        })
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/leave-requests/{}/reject", request.id))
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&unit_head)),
        ))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = ctx.leave_repo.find_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::Rejected);
    assert_eq!(stored.kepala_upt_notes.as_deref(), Some("Permintaan ditolak."));
    assert_eq!(stored.kepala_upt_id, Some(unit_head.id));
    // The section-head fields stay untouched on a unit-head rejection
    assert_eq!(stored.section_head_id, None);
}

#[actix_web::test]
#[serial]
async fn test_decide_on_terminal_request_is_rejected() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Recovering from a minor operation".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(3),
            days_requested: 4,
        })
        .await
        .unwrap();
    ctx.leave_repo
        .approve_by_unit_head(request.id, unit_head.id, None)
        .await
        .unwrap();

    // Approving again must fail, not double-apply
    for action in ["approve", "reject"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/leave-requests/{}/{}", request.id, action))
            .insert_header((
                "Authorization",
                format!("Bearer {}", ctx.token_for(&unit_head)),
            ))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    let stored = ctx.leave_repo.find_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, LeaveStatus::ApprovedByKepalaUpt);
}

#[actix_web::test]
#[serial]
async fn test_staff_cannot_delete_after_first_approval() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Travel plans I might still cancel".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(1),
            days_requested: 2,
        })
        .await
        .unwrap();
    ctx.leave_repo
        .approve_by_section_head(request.id, head.id, None)
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/leave-requests/{}", request.id))
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&staff))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert!(ctx.leave_repo.find_by_id(request.id).await.unwrap().is_some());
}

#[actix_web::test]
#[serial]
async fn test_staff_deletes_own_pending_request() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;

    let request = ctx
        .leave_repo
        .create_request(NewLeaveRequest {
            user_id: staff.id,
            reason: "Changed my mind about this trip".to_string(),
            start_date: Utc::now().date_naive(),
            end_date: Utc::now().date_naive() + Duration::days(1),
            days_requested: 2,
        })
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/leave-requests/{}", request.id))
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&staff))))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(ctx.leave_repo.find_by_id(request.id).await.unwrap().is_none());
}

#[actix_web::test]
#[serial]
async fn test_unit_head_cannot_submit_requests() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&unit_head)),
        ))
        .set_json(json!({
            "reason": "The unit head also wants a break",
            "startDate": date_str(1),
            "endDate": date_str(2),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
#[serial]
async fn test_list_visibility_per_role() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head_a = ctx.seed_section_head(Section::A, &unit_head).await;
    let head_b = ctx.seed_section_head(Section::B, &unit_head).await;
    let staff_a = ctx.seed_staff("budi", Section::A, &head_a).await;
    let staff_b = ctx.seed_staff("sari", Section::B, &head_b).await;

    for staff in [&staff_a, &staff_b] {
        ctx.leave_repo
            .create_request(NewLeaveRequest {
                user_id: staff.id,
                reason: "A few days off for family matters".to_string(),
                start_date: Utc::now().date_naive(),
                end_date: Utc::now().date_naive() + Duration::days(1),
                days_requested: 2,
            })
            .await
            .unwrap();
    }

    // Staff sees only their own request
    let req = test::TestRequest::get()
        .uri("/api/v1/leave-requests")
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&staff_a)),
        ))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);

    // Section head A sees their section only
    let req = test::TestRequest::get()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", ctx.token_for(&head_a))))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);

    // The unit head sees everything
    let req = test::TestRequest::get()
        .uri("/api/v1/leave-requests")
        .insert_header((
            "Authorization",
            format!("Bearer {}", ctx.token_for(&unit_head)),
        ))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 2);
}

#[actix_web::test]
#[serial]
async fn test_validation_errors_on_submit() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let unit_head = ctx.seed_unit_head().await;
    let head = ctx.seed_section_head(Section::A, &unit_head).await;
    let staff = ctx.seed_staff("budi", Section::A, &head).await;
    let token = ctx.token_for(&staff);

    // Reason too short
    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "reason": "too short",
            "startDate": date_str(1),
            "endDate": date_str(2),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // End before start
    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "reason": "Dates are accidentally swapped here",
            "startDate": date_str(5),
            "endDate": date_str(3),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Start date in the past
    let req = test::TestRequest::post()
        .uri("/api/v1/leave-requests")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "reason": "Trying to backdate a leave request",
            "startDate": date_str(-3),
            "endDate": date_str(2),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn test_requests_require_authentication() {
    let ctx = common::TestContext::new().await.unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave-requests")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
