use sea_orm::DatabaseConnection;

use crate::infra::db::{DbAccountRepository, DbResourceRepository, DbUserRepository};
use crate::infra::password::Argon2Hasher;
use crate::usecase::account::AccountService;
use crate::usecase::user::UserService;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hasher: Argon2Hasher,
    /// Role linked to every newly created user.
    pub default_role_id: String,
}

pub type DbUserService =
    UserService<DbUserRepository, DbResourceRepository, DbAccountRepository, Argon2Hasher>;

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn resource_repo(&self) -> DbResourceRepository {
        DbResourceRepository {
            db: self.db.clone(),
        }
    }

    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn account_service(&self) -> AccountService<DbAccountRepository> {
        AccountService {
            repo: self.account_repo(),
        }
    }

    pub fn user_service(&self) -> DbUserService {
        UserService {
            users: self.user_repo(),
            resources: self.resource_repo(),
            accounts: self.account_service(),
            hasher: self.hasher.clone(),
            default_role_id: self.default_role_id.clone(),
        }
    }
}
