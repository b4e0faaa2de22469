use actix_web::web;
use anyhow::Result;
use tempfile::TempDir;
use uuid::Uuid;

use cuti_be::config::Config;
use cuti_be::database::init_database;
use cuti_be::database::models::{Gender, NewUser, Role, Section, User};
use cuti_be::database::repositories::{LeaveRequestRepository, UserRepository};
use cuti_be::services::AuthService;
use cuti_be::AppState;

// Test database and service wrapper
pub struct TestContext {
    pub pool: sqlx::SqlitePool,
    pub config: Config,
    pub user_repo: UserRepository,
    pub leave_repo: LeaveRequestRepository,
    pub auth_service: AuthService,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());
        let pool = init_database(&database_url).await?;

        let config = Config {
            database_url,
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
        };

        let user_repo = UserRepository::new(pool.clone());
        let leave_repo = LeaveRequestRepository::new(pool.clone());
        let auth_service = AuthService::new(config.clone(), user_repo.clone());

        Ok(TestContext {
            pool,
            config,
            user_repo,
            leave_repo,
            auth_service,
            _temp_dir: temp_dir,
        })
    }

    pub fn app_state(&self) -> web::Data<AppState> {
        web::Data::new(AppState {
            auth_service: self.auth_service.clone(),
        })
    }

    pub fn user_repo_data(&self) -> web::Data<UserRepository> {
        web::Data::new(self.user_repo.clone())
    }

    pub fn leave_repo_data(&self) -> web::Data<LeaveRequestRepository> {
        web::Data::new(self.leave_repo.clone())
    }

    pub fn config_data(&self) -> web::Data<Config> {
        web::Data::new(self.config.clone())
    }

    pub async fn seed_user(
        &self,
        username: &str,
        role: Role,
        supervisor_id: Option<Uuid>,
    ) -> User {
        // Low bcrypt cost keeps the suite fast; these hashes protect nothing.
        let password_hash = bcrypt::hash("password123", 4).unwrap();

        let user = User::new(NewUser {
            username: username.to_string(),
            full_name: format!("{} Full Name", username),
            nip: random_nip(),
            position: "Test Position".to_string(),
            gender: Gender::Male,
            phone: None,
            role,
            supervisor_id,
            password_hash,
        });

        self.user_repo.create_user(&user).await.unwrap()
    }

    pub async fn seed_unit_head(&self) -> User {
        self.seed_user("kepala.upt", Role::UnitHead, None).await
    }

    pub async fn seed_section_head(&self, section: Section, unit_head: &User) -> User {
        let username = format!("kepala.seksi.{}", section);
        self.seed_user(
            &username,
            Role::SectionHead(section),
            Some(unit_head.id),
        )
        .await
    }

    pub async fn seed_staff(&self, username: &str, section: Section, head: &User) -> User {
        self.seed_user(username, Role::Staff(section), Some(head.id))
            .await
    }

    pub fn token_for(&self, user: &User) -> String {
        self.auth_service.generate_token(user).unwrap()
    }
}

fn random_nip() -> String {
    // 16 numeric digits, unique enough per test run.
    let raw = Uuid::new_v4().as_u128().to_string();
    format!("{:0>16}", &raw[..16.min(raw.len())])
}
