use chrono::{DateTime, NaiveDate, Utc};

use keel_domain::pagination::{PageRequest, Sort};

/// User projection returned by every user-facing operation.
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Unique lookup key for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(String),
    Email(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

/// A role together with the permissions it grants, as loaded from the join tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithPermissions {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Navigable menu item gated by permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// External-provider linkage owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full user row plus its role graph, as loaded by the repository.
#[derive(Debug, Clone)]
pub struct UserGraph {
    pub user: User,
    pub password: String,
    pub roles: Vec<RoleWithPermissions>,
}

/// Full user with flattened roles, permissions and visible resources.
///
/// `permissions` is the concatenation of every role's permissions in role
/// order; a permission shared by two roles appears twice.
#[derive(Debug, Clone)]
pub struct UserDetail {
    pub user: User,
    pub password: String,
    pub roles: Vec<Role>,
    pub role_names: Vec<String>,
    pub permissions: Vec<Permission>,
    pub permission_names: Vec<String>,
    pub resources: Vec<Resource>,
}

/// Public profile: identity, display fields, role and permission names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub login_at: Option<DateTime<Utc>>,
    pub role_names: Vec<String>,
    pub permission_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDetail> for UserProfile {
    fn from(detail: UserDetail) -> Self {
        let UserDetail {
            user,
            role_names,
            permission_names,
            ..
        } = detail;
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            display_name: user.display_name,
            avatar: user.avatar,
            gender: user.gender,
            birthday: user.birthday,
            email_verified_at: user.email_verified_at,
            login_at: user.login_at,
            role_names,
            permission_names,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Row to insert for a new user. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Account row inserted together with a new user.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
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

/// Partial user update. `None` leaves the column untouched; `password` is already hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Partial account update of the provider token fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Filters for user list queries. Text filters match substrings, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub email: Option<String>,
    pub name: Option<String>,
    pub verified: Option<bool>,
}

/// Sort options for user list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortBy {
    CreatedAt(Sort),
    Email(Sort),
    Name(Sort),
}

impl Default for UserSortBy {
    fn default() -> Self {
        Self::CreatedAt(Sort::Desc)
    }
}

impl UserSortBy {
    pub fn from_kebab_case(s: &str) -> Option<Self> {
        match s {
            "created-at-desc" => Some(Self::CreatedAt(Sort::Desc)),
            "created-at-asc" => Some(Self::CreatedAt(Sort::Asc)),
            "email-desc" => Some(Self::Email(Sort::Desc)),
            "email-asc" => Some(Self::Email(Sort::Asc)),
            "name-desc" => Some(Self::Name(Sort::Desc)),
            "name-asc" => Some(Self::Name(Sort::Asc)),
            _ => None,
        }
    }
}

/// Generic list query: filters, sort and page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    pub filter: UserFilter,
    pub sort_by: UserSortBy,
    pub page: PageRequest,
}
