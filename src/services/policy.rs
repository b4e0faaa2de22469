//! Authorization decisions for the leave workflow.
//!
//! Every function here is a pure predicate over the acting user and the
//! target entities. Callers load the records, ask the policy, and only then
//! touch the store; nothing in this module reads ambient state.

use crate::database::models::{LeaveRequest, LeaveStatus, Role, User};

/// Whether `target` reports directly to `actor`.
fn supervises(actor: &User, target: &User) -> bool {
    target.supervisor_id == Some(actor.id)
}

/// Only staff and section heads submit leave requests; the unit head has
/// nobody to approve theirs.
pub fn can_submit_request(actor: &User) -> bool {
    actor.role.is_staff() || actor.role.is_section_head()
}

pub fn can_view_request(actor: &User, requester: &User, request: &LeaveRequest) -> bool {
    match actor.role {
        Role::UnitHead => true,
        Role::SectionHead(_) => request.user_id == actor.id || supervises(actor, requester),
        Role::Staff(_) => request.user_id == actor.id,
    }
}

/// Shared eligibility predicate for approve and reject: whoever may approve a
/// request may also reject it. The two actions differ only in the resulting
/// transition.
pub fn can_decide_request(actor: &User, requester: &User, request: &LeaveRequest) -> bool {
    match actor.role {
        Role::UnitHead => matches!(
            request.status,
            LeaveStatus::Pending | LeaveStatus::ApprovedBySectionHead
        ),
        Role::SectionHead(_) => {
            request.status == LeaveStatus::Pending && supervises(actor, requester)
        }
        Role::Staff(_) => false,
    }
}

pub fn can_delete_request(actor: &User, requester: &User, request: &LeaveRequest) -> bool {
    match actor.role {
        Role::UnitHead => true,
        Role::SectionHead(_) => supervises(actor, requester),
        Role::Staff(_) => request.user_id == actor.id && request.status == LeaveStatus::Pending,
    }
}

pub fn can_view_user(actor: &User, target: &User) -> bool {
    match actor.role {
        Role::UnitHead => true,
        Role::SectionHead(section) => {
            target.id == actor.id || target.role == Role::Staff(section)
        }
        Role::Staff(_) => false,
    }
}

pub fn can_create_user(actor: &User, new_role: &Role) -> bool {
    match (&actor.role, new_role) {
        (Role::UnitHead, _) => true,
        (Role::SectionHead(own), Role::Staff(section)) => own == section,
        _ => false,
    }
}

pub fn can_edit_user(actor: &User, target: &User) -> bool {
    match actor.role {
        Role::UnitHead => !target.role.is_unit_head(),
        Role::SectionHead(section) => target.role == Role::Staff(section),
        Role::Staff(_) => false,
    }
}

pub fn can_delete_user(actor: &User, target: &User) -> bool {
    can_edit_user(actor, target)
}
