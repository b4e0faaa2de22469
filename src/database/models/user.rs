use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum Section {
        A => "A",
        B => "B",
        C => "C",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Gender {
        Male => "male",
        Female => "female",
    }
}

/// Organizational role. A section head and a staff member always belong to a
/// section; the unit head never does. Keeping the section inside the variant
/// makes a section-less staff member unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "section", rename_all = "snake_case")]
pub enum Role {
    UnitHead,
    SectionHead(Section),
    Staff(Section),
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::UnitHead => "unit_head",
            Role::SectionHead(_) => "section_head",
            Role::Staff(_) => "staff",
        }
    }

    pub fn section(&self) -> Option<Section> {
        match self {
            Role::UnitHead => None,
            Role::SectionHead(section) | Role::Staff(section) => Some(*section),
        }
    }

    pub fn is_unit_head(&self) -> bool {
        matches!(self, Role::UnitHead)
    }

    pub fn is_section_head(&self) -> bool {
        matches!(self, Role::SectionHead(_))
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff(_))
    }

    /// Rebuild a role from the two storage columns. A unit head must not
    /// carry a section, the other roles must.
    pub fn from_columns(role: &str, section: Option<Section>) -> Result<Self, String> {
        match (role, section) {
            ("unit_head", None) => Ok(Role::UnitHead),
            ("unit_head", Some(_)) => Err("unit_head must not have a section".to_string()),
            ("section_head", Some(section)) => Ok(Role::SectionHead(section)),
            ("staff", Some(section)) => Ok(Role::Staff(section)),
            ("section_head", None) | ("staff", None) => {
                Err(format!("{} requires a section", role))
            }
            (other, _) => Err(format!("Invalid Role: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub full_name: String,
    pub nip: String,
    pub position: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub role: Role,
    pub annual_leave_quota: i64,
    pub supervisor_id: Option<Uuid>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// The role is stored in two columns (role, section) and fused back into the
// tagged variant on load, so FromRow is written out by hand.
impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let section: Option<Section> = row.try_get("section")?;
        let role = Role::from_columns(&role_str, section).map_err(|source| {
            sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: source.into(),
            }
        })?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            nip: row.try_get("nip")?,
            position: row.try_get("position")?,
            gender: row.try_get("gender")?,
            phone: row.try_get("phone")?,
            role,
            annual_leave_quota: row.try_get("annual_leave_quota")?,
            supervisor_id: row.try_get("supervisor_id")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl User {
    pub fn new(input: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.full_name.clone(),
            username: input.username,
            full_name: input.full_name,
            nip: input.nip,
            position: input.position,
            gender: input.gender,
            phone: input.phone,
            role: input.role,
            annual_leave_quota: DEFAULT_ANNUAL_LEAVE_QUOTA,
            supervisor_id: input.supervisor_id,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Every new user starts the year with twelve days of annual leave.
pub const DEFAULT_ANNUAL_LEAVE_QUOTA: i64 = 12;

/// Validated fields for inserting a user; built by the handler after the
/// policy check and supervisor derivation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub nip: String,
    pub position: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub role: Role,
    pub supervisor_id: Option<Uuid>,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub username: String,
    pub full_name: String,
    pub nip: String,
    pub position: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub role: String,
    pub section: Option<Section>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub full_name: String,
    pub position: String,
    pub phone: Option<String>,
    pub annual_leave_quota: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Public projection of a user record; the password hash never leaves the
/// database layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub full_name: String,
    pub nip: String,
    pub position: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub role: &'static str,
    pub section: Option<Section>,
    pub annual_leave_quota: i64,
    pub supervisor_id: Option<Uuid>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            full_name: user.full_name,
            nip: user.nip,
            position: user.position,
            gender: user.gender,
            phone: user.phone,
            role: user.role.as_str(),
            section: user.role.section(),
            annual_leave_quota: user.annual_leave_quota,
            supervisor_id: user.supervisor_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_from_columns_requires_section_for_scoped_roles() {
        assert!(Role::from_columns("section_head", None).is_err());
        assert!(Role::from_columns("staff", None).is_err());
        assert_eq!(
            Role::from_columns("staff", Some(Section::B)),
            Ok(Role::Staff(Section::B))
        );
    }

    #[test]
    fn role_from_columns_rejects_sectioned_unit_head() {
        assert!(Role::from_columns("unit_head", Some(Section::A)).is_err());
        assert_eq!(Role::from_columns("unit_head", None), Ok(Role::UnitHead));
    }

    #[test]
    fn role_string_round_trip() {
        let role = Role::SectionHead(Section::C);
        assert_eq!(role.as_str(), "section_head");
        assert_eq!(Role::from_columns(role.as_str(), role.section()), Ok(role));
    }
}
