use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use keel_domain::pagination::Page;

use crate::domain::repository::{
    AccountRepository, PasswordHashPort, ResourceRepository, UserRepository,
};
use crate::domain::types::{
    Account, AccountPatch, NewAccount, NewUser, Permission, Resource, User, UserDetail, UserGraph,
    UserKey, UserListQuery, UserPatch, UserProfile,
};
use crate::error::UsersServiceError;
use crate::usecase::account::AccountService;

const CACHE_KEY_PREFIX: &str = "user";

// ── Inputs ───────────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

pub struct NewAccountInput {
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

// ── UserService ──────────────────────────────────────────────────────────────

/// Account CRUD and role/permission resolution over the user repositories.
///
/// `default_role_id` is linked to every user created through [`UserService::create`].
pub struct UserService<U, R, A, H>
where
    U: UserRepository,
    R: ResourceRepository,
    A: AccountRepository,
    H: PasswordHashPort,
{
    pub users: U,
    pub resources: R,
    pub accounts: AccountService<A>,
    pub hasher: H,
    pub default_role_id: String,
}

impl<U, R, A, H> UserService<U, R, A, H>
where
    U: UserRepository,
    R: ResourceRepository,
    A: AccountRepository,
    H: PasswordHashPort,
{
    pub async fn create(
        &self,
        input: CreateUserInput,
        account: NewAccountInput,
    ) -> Result<User, UsersServiceError> {
        let key = UserKey::Email(input.email.clone());
        if self.users.find(&key).await?.is_some() {
            return Err(UsersServiceError::UserAlreadyExists);
        }
        let password =
            self.hash_password(&input.password, input.password_confirmation.as_deref())?;

        let user = NewUser {
            id: Uuid::now_v7().to_string(),
            email: input.email,
            password,
            name: input.name,
            display_name: input.display_name,
            avatar: input.avatar,
            gender: input.gender,
            birthday: input.birthday,
            created_at: Utc::now(),
        };
        let account = NewAccount {
            id: Uuid::now_v7().to_string(),
            kind: account.kind,
            provider: account.provider,
            provider_account_id: account.provider_account_id,
            access_token: account.access_token,
            refresh_token: account.refresh_token,
            expires_at: account.expires_at,
            token_type: account.token_type,
            scope: account.scope,
            id_token: account.id_token,
        };

        let created = self
            .users
            .create_with_account(&user, &account, &self.default_role_id)
            .await?;
        info!(
            user_id = %created.id,
            role_id = %self.default_role_id,
            provider = %account.provider,
            "user created"
        );
        Ok(created)
    }

    pub async fn find_all(&self, query: UserListQuery) -> Result<Page<User>, UsersServiceError> {
        let page = query.page.clamped();
        let items = self.users.list(&query.filter, query.sort_by, page).await?;
        let total = self.users.count(&query.filter).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn find_one(&self, id: &str) -> Result<Option<User>, UsersServiceError> {
        self.users.find(&UserKey::Id(id.to_owned())).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UsersServiceError> {
        self.users.find(&UserKey::Email(email.to_owned())).await
    }

    /// Load the user with flattened roles and permissions, and the visible
    /// resources when `include_resources` is set. `Ok(None)` if no user matches.
    pub async fn find_user(
        &self,
        key: &UserKey,
        include_resources: bool,
    ) -> Result<Option<UserDetail>, UsersServiceError> {
        let Some(graph) = self.users.find_graph(key).await? else {
            return Ok(None);
        };
        let mut detail = flatten_user(graph);
        if include_resources {
            detail.resources = self.parse_user_resources(&detail.permissions).await?;
        }
        Ok(Some(detail))
    }

    pub async fn find_by_email_x(
        &self,
        email: &str,
        include_resources: bool,
    ) -> Result<Option<UserDetail>, UsersServiceError> {
        self.find_user(&UserKey::Email(email.to_owned()), include_resources)
            .await
    }

    pub async fn find_by_id_x(
        &self,
        id: &str,
        include_resources: bool,
    ) -> Result<Option<UserDetail>, UsersServiceError> {
        self.find_user(&UserKey::Id(id.to_owned()), include_resources)
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        input: UpdateUserInput,
    ) -> Result<User, UsersServiceError> {
        if id.trim().is_empty() {
            return Err(UsersServiceError::InvalidId);
        }
        let password = match input.password.as_deref() {
            Some(password) => {
                Some(self.hash_password(password, input.password_confirmation.as_deref())?)
            }
            None => None,
        };
        let patch = UserPatch {
            email: input.email,
            password,
            name: input.name,
            display_name: input.display_name,
            avatar: input.avatar,
            gender: input.gender,
            birthday: input.birthday,
        };
        self.users.update(id, &patch).await
    }

    pub async fn remove(&self, id: &str) -> Result<User, UsersServiceError> {
        let deleted = self.users.delete(id).await?;
        info!(user_id = %deleted.id, "user deleted");
        Ok(deleted)
    }

    /// Mark the email as verified. Already verified users are returned unchanged.
    pub async fn verify_email(&self, email: &str) -> Result<User, UsersServiceError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(UsersServiceError::EmailNotRegistered)?;
        if user.is_email_verified() {
            debug!(user_id = %user.id, "email already verified");
            return Ok(user);
        }
        let verified = self.users.set_email_verified(&user.id, Utc::now()).await?;
        info!(user_id = %verified.id, "email verified");
        Ok(verified)
    }

    /// Every resource visible to the user, as a single page.
    pub async fn find_user_resources(
        &self,
        email: &str,
    ) -> Result<Page<Resource>, UsersServiceError> {
        let detail = self
            .find_by_email_x(email, true)
            .await?
            .ok_or(UsersServiceError::UserNotFound)?;
        Ok(Page::single(detail.resources))
    }

    pub async fn get_user_profile_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserProfile>, UsersServiceError> {
        self.get_user_profile(&UserKey::Email(email.to_owned()))
            .await
    }

    pub async fn get_user_profile_by_id(
        &self,
        id: &str,
    ) -> Result<Option<UserProfile>, UsersServiceError> {
        self.get_user_profile(&UserKey::Id(id.to_owned())).await
    }

    pub async fn get_user_profile(
        &self,
        key: &UserKey,
    ) -> Result<Option<UserProfile>, UsersServiceError> {
        let detail = self.find_user(key, false).await?;
        Ok(detail.map(UserProfile::from))
    }

    pub async fn update_account(
        &self,
        provider: &str,
        provider_account_id: &str,
        patch: AccountPatch,
    ) -> Result<Account, UsersServiceError> {
        self.accounts
            .update(provider, provider_account_id, patch)
            .await
    }

    /// Resources linked to any of the given permissions. Ids are passed as-is;
    /// the repository returns each resource once.
    async fn parse_user_resources(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<Resource>, UsersServiceError> {
        let permission_ids: Vec<String> = permissions.iter().map(|p| p.id.clone()).collect();
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.resources.list_by_permission_ids(&permission_ids).await
    }

    fn hash_password(
        &self,
        password: &str,
        confirmation: Option<&str>,
    ) -> Result<String, UsersServiceError> {
        check_password(password, confirmation)?;
        self.hasher.hash(password)
    }
}

/// Cache key for a user item: `user:<part>[:<part>...]`.
pub fn item_cache_key(parts: &[&str]) -> String {
    let mut key = String::from(CACHE_KEY_PREFIX);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}

/// A password must be non-empty; a confirmation, when given, must match it.
fn check_password(password: &str, confirmation: Option<&str>) -> Result<(), UsersServiceError> {
    if password.is_empty() {
        return Err(UsersServiceError::InvalidPassword);
    }
    match confirmation {
        Some(confirmation) if confirmation != password => Err(UsersServiceError::PasswordMismatch),
        _ => Ok(()),
    }
}

fn flatten_user(graph: UserGraph) -> UserDetail {
    let UserGraph {
        user,
        password,
        roles,
    } = graph;

    let mut flat_roles = Vec::with_capacity(roles.len());
    let mut permissions = Vec::new();
    for entry in roles {
        flat_roles.push(entry.role);
        permissions.extend(entry.permissions);
    }
    let role_names = flat_roles.iter().map(|r| r.name.clone()).collect();
    let permission_names = permissions.iter().map(|p| p.name.clone()).collect();

    UserDetail {
        user,
        password,
        roles: flat_roles,
        role_names,
        permissions,
        permission_names,
        resources: Vec::new(),
    }
}
