use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{Role, Section, UpdateUserInput, User};

const USER_COLUMNS: &str = r#"
    id,
    name,
    username,
    full_name,
    nip,
    position,
    gender,
    phone,
    role,
    section,
    annual_leave_quota,
    supervisor_id,
    password_hash,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user: &User) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO
                users (
                    id,
                    name,
                    username,
                    full_name,
                    nip,
                    position,
                    gender,
                    phone,
                    role,
                    section,
                    annual_leave_quota,
                    supervisor_id,
                    password_hash,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.full_name)
            .bind(&user.nip)
            .bind(&user.position)
            .bind(user.gender)
            .bind(&user.phone)
            .bind(user.role.as_str())
            .bind(user.role.section())
            .bind(user.annual_leave_quota)
            .bind(user.supervisor_id)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    pub async fn nip_exists(&self, nip: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE nip = ?")
            .bind(nip)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Direct reports only; staff users have none.
    pub async fn subordinates_of(&self, id: Uuid) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE supervisor_id = ?");
        let users = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn find_section_head_for(&self, section: Section) -> Result<Option<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'section_head' AND section = ?"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(section)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_unit_head(&self) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE role = 'unit_head'");
        let user = sqlx::query_as::<_, User>(&query)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Users visible to a unit head: everyone, newest first.
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Users visible to a section head: the staff of their own section.
    pub async fn list_staff_in_section(
        &self,
        section: Section,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role = 'staff' AND section = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(section)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn count_staff_in_section(&self, section: Section) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'staff' AND section = ?")
                .bind(section)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn update_profile(&self, id: Uuid, input: &UpdateUserInput) -> Result<User> {
        let query = format!(
            r#"
            UPDATE users
            SET
                name = ?,
                full_name = ?,
                position = ?,
                phone = ?,
                annual_leave_quota = COALESCE(?, annual_leave_quota),
                updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.full_name)
            .bind(&input.full_name)
            .bind(&input.position)
            .bind(&input.phone)
            .bind(input.annual_leave_quota)
            .bind(Utc::now())
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Supervisor derivation for new users: staff report to the section head
    /// of their section, section heads report to the unit head. Either may be
    /// absent, in which case the link stays empty.
    pub async fn derive_supervisor_id(&self, role: &Role) -> Result<Option<Uuid>> {
        let supervisor = match role {
            Role::Staff(section) => self.find_section_head_for(*section).await?,
            Role::SectionHead(_) => self.find_unit_head().await?,
            Role::UnitHead => None,
        };

        Ok(supervisor.map(|u| u.id))
    }
}
