pub(crate) mod macros;

pub mod leave_request;
pub mod user;

pub use leave_request::{CreateLeaveRequestInput, LeaveRequest, LeaveStatus, NewLeaveRequest};
pub use user::{
    AuthResponse, CreateUserInput, Gender, LoginInput, NewUser, Role, Section, UpdateUserInput,
    User, UserInfo, DEFAULT_ANNUAL_LEAVE_QUOTA,
};
