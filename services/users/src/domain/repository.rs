#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use crate::domain::types::{
    Account, AccountPatch, NewAccount, NewUser, Resource, User, UserFilter, UserGraph, UserKey,
    UserPatch, UserSortBy,
};
use crate::error::UsersServiceError;

use keel_domain::pagination::PageRequest;

/// Repository for user rows and their role graph.
pub trait UserRepository: Send + Sync {
    /// Projected user by unique key.
    async fn find(&self, key: &UserKey) -> Result<Option<User>, UsersServiceError>;

    /// Full user row with roles and each role's permissions.
    async fn find_graph(&self, key: &UserKey) -> Result<Option<UserGraph>, UsersServiceError>;

    async fn list(
        &self,
        filter: &UserFilter,
        sort_by: UserSortBy,
        page: PageRequest,
    ) -> Result<Vec<User>, UsersServiceError>;

    /// Number of users matching `filter`, ignoring pagination.
    async fn count(&self, filter: &UserFilter) -> Result<u64, UsersServiceError>;

    /// Insert the user, its account and a link to `role_id` atomically (same transaction).
    ///
    /// Returns `UserAlreadyExists` if any unique key is taken at insert time: the
    /// email, or the account's `(provider, provider_account_id)` pair, which
    /// already identifies an existing user.
    async fn create_with_account(
        &self,
        user: &NewUser,
        account: &NewAccount,
        role_id: &str,
    ) -> Result<User, UsersServiceError>;

    /// Apply a partial update. Returns `UserNotFound` if no row has `id`.
    async fn update(&self, id: &str, patch: &UserPatch) -> Result<User, UsersServiceError>;

    async fn set_email_verified(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<User, UsersServiceError>;

    /// Hard delete. Returns the deleted row's projection, or `UserNotFound`.
    async fn delete(&self, id: &str) -> Result<User, UsersServiceError>;
}

/// Repository for permission-gated resources.
pub trait ResourceRepository: Send + Sync {
    /// Resources linked to at least one of `permission_ids`, each returned once.
    async fn list_by_permission_ids(
        &self,
        permission_ids: &[String],
    ) -> Result<Vec<Resource>, UsersServiceError>;
}

/// Repository for provider accounts.
pub trait AccountRepository: Send + Sync {
    /// Returns `AccountNotFound` if no account matches the provider pair.
    async fn update(
        &self,
        provider: &str,
        provider_account_id: &str,
        patch: &AccountPatch,
    ) -> Result<Account, UsersServiceError>;
}

/// Salted one-way password hashing.
pub trait PasswordHashPort: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, UsersServiceError>;
}
