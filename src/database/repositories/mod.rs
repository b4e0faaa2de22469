pub mod leave_request;
pub mod user;

pub use leave_request::LeaveRequestRepository;
pub use user::UserRepository;
