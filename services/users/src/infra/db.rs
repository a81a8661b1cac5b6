use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel as _, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, SelectModel, Selector, SqlErr, TransactionError,
    TransactionTrait,
    sea_query::{Expr, Func, Query, SimpleExpr},
};

use keel_domain::pagination::{PageRequest, Sort};
use keel_users_schema::{
    accounts, permissions, resource_permissions, resources, roles, user_roles, users,
};

use crate::domain::repository::{AccountRepository, ResourceRepository, UserRepository};
use crate::domain::types::{
    Account, AccountPatch, NewAccount, NewUser, Permission, Resource, Role, RoleWithPermissions,
    User, UserFilter, UserGraph, UserKey, UserPatch, UserSortBy,
};
use crate::error::UsersServiceError;

/// Columns a [`User`] projection may read. The password hash is not among them.
const USER_COLUMNS: [users::Column; 11] = [
    users::Column::Id,
    users::Column::Email,
    users::Column::Name,
    users::Column::DisplayName,
    users::Column::Avatar,
    users::Column::Gender,
    users::Column::Birthday,
    users::Column::EmailVerifiedAt,
    users::Column::LoginAt,
    users::Column::CreatedAt,
    users::Column::UpdatedAt,
];

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    display_name: Option<String>,
    avatar: Option<String>,
    gender: Option<String>,
    birthday: Option<NaiveDate>,
    email_verified_at: Option<DateTime<Utc>>,
    login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn projected(select: Select<users::Entity>) -> Selector<SelectModel<UserRow>> {
    select
        .select_only()
        .columns(USER_COLUMNS)
        .into_model::<UserRow>()
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find(&self, key: &UserKey) -> Result<Option<User>, UsersServiceError> {
        let row = projected(users::Entity::find().filter(key_expr(key)))
            .one(&self.db)
            .await
            .context("find user")?;
        Ok(row.map(user_from_row))
    }

    async fn find_graph(&self, key: &UserKey) -> Result<Option<UserGraph>, UsersServiceError> {
        let Some(model) = users::Entity::find()
            .filter(key_expr(key))
            .one(&self.db)
            .await
            .context("find user for role graph")?
        else {
            return Ok(None);
        };

        let roles = model
            .find_related(roles::Entity)
            .find_with_related(permissions::Entity)
            .all(&self.db)
            .await
            .context("load user roles with permissions")?
            .into_iter()
            .map(|(role, permissions)| RoleWithPermissions {
                role: role_from_model(role),
                permissions: permissions.into_iter().map(permission_from_model).collect(),
            })
            .collect();

        let password = model.password.clone();
        Ok(Some(UserGraph {
            user: user_from_model(model),
            password,
            roles,
        }))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort_by: UserSortBy,
        page: PageRequest,
    ) -> Result<Vec<User>, UsersServiceError> {
        let page = page.clamped();
        let rows = projected(
            user_select(filter, sort_by)
                .offset(page.offset())
                .limit(u64::from(page.limit)),
        )
        .all(&self.db)
        .await
        .context("list users")?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, UsersServiceError> {
        let total = users::Entity::find()
            .filter(user_condition(filter))
            .count(&self.db)
            .await
            .context("count users")?;
        Ok(total)
    }

    async fn create_with_account(
        &self,
        user: &NewUser,
        account: &NewAccount,
        role_id: &str,
    ) -> Result<User, UsersServiceError> {
        let result = self
            .db
            .transaction::<_, users::Model, DbErr>(|txn| {
                let user = user.clone();
                let account = account.clone();
                let role_id = role_id.to_owned();
                Box::pin(async move {
                    let model = users::ActiveModel {
                        id: Set(user.id.clone()),
                        email: Set(user.email),
                        password: Set(user.password),
                        name: Set(user.name),
                        display_name: Set(user.display_name),
                        avatar: Set(user.avatar),
                        gender: Set(user.gender),
                        birthday: Set(user.birthday),
                        email_verified_at: Set(None),
                        login_at: Set(None),
                        created_at: Set(user.created_at),
                        updated_at: Set(user.created_at),
                    }
                    .insert(txn)
                    .await?;

                    accounts::ActiveModel {
                        id: Set(account.id),
                        user_id: Set(user.id.clone()),
                        kind: Set(account.kind),
                        provider: Set(account.provider),
                        provider_account_id: Set(account.provider_account_id),
                        access_token: Set(account.access_token),
                        refresh_token: Set(account.refresh_token),
                        expires_at: Set(account.expires_at),
                        token_type: Set(account.token_type),
                        scope: Set(account.scope),
                        id_token: Set(account.id_token),
                        created_at: Set(user.created_at),
                        updated_at: Set(user.created_at),
                    }
                    .insert(txn)
                    .await?;

                    user_roles::ActiveModel {
                        user_id: Set(user.id),
                        role_id: Set(role_id),
                        created_at: Set(user.created_at),
                    }
                    .insert(txn)
                    .await?;

                    Ok(model)
                })
            })
            .await;

        match result {
            Ok(model) => Ok(user_from_model(model)),
            // Email or provider pair already taken, typically by a concurrent create.
            Err(TransactionError::Transaction(ref e)) if is_unique_violation(e) => {
                Err(UsersServiceError::UserAlreadyExists)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("create user with account")
                .into()),
        }
    }

    async fn update(&self, id: &str, patch: &UserPatch) -> Result<User, UsersServiceError> {
        let mut am = users::ActiveModel {
            id: Set(id.to_owned()),
            ..Default::default()
        };
        if let Some(email) = &patch.email {
            am.email = Set(email.clone());
        }
        if let Some(password) = &patch.password {
            am.password = Set(password.clone());
        }
        if let Some(name) = &patch.name {
            am.name = Set(Some(name.clone()));
        }
        if let Some(display_name) = &patch.display_name {
            am.display_name = Set(Some(display_name.clone()));
        }
        if let Some(avatar) = &patch.avatar {
            am.avatar = Set(Some(avatar.clone()));
        }
        if let Some(gender) = &patch.gender {
            am.gender = Set(Some(gender.clone()));
        }
        if let Some(birthday) = patch.birthday {
            am.birthday = Set(Some(birthday));
        }
        am.updated_at = Set(Utc::now());

        match am.update(&self.db).await {
            Ok(model) => Ok(user_from_model(model)),
            Err(DbErr::RecordNotUpdated) => Err(UsersServiceError::UserNotFound),
            Err(e) if is_unique_violation(&e) => Err(UsersServiceError::UserAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("update user").into()),
        }
    }

    async fn set_email_verified(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<User, UsersServiceError> {
        let am = users::ActiveModel {
            id: Set(id.to_owned()),
            email_verified_at: Set(Some(at)),
            updated_at: Set(at),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(model) => Ok(user_from_model(model)),
            Err(DbErr::RecordNotUpdated) => Err(UsersServiceError::UserNotFound),
            Err(e) => Err(anyhow::Error::new(e).context("set email verified").into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<User, UsersServiceError> {
        let deleted = self
            .db
            .transaction::<_, Option<users::Model>, DbErr>(|txn| {
                let id = id.to_owned();
                Box::pin(async move {
                    let Some(model) = users::Entity::find_by_id(id).one(txn).await? else {
                        return Ok(None);
                    };
                    users::Entity::delete_by_id(model.id.clone())
                        .exec(txn)
                        .await?;
                    Ok(Some(model))
                })
            })
            .await
            .context("delete user")?;
        deleted
            .map(user_from_model)
            .ok_or(UsersServiceError::UserNotFound)
    }
}

/// Translate a list query's filter and sort into a sea-orm select over `users`.
pub fn user_select(filter: &UserFilter, sort_by: UserSortBy) -> Select<users::Entity> {
    let query = users::Entity::find().filter(user_condition(filter));
    match sort_by {
        UserSortBy::CreatedAt(Sort::Desc) => query.order_by_desc(users::Column::CreatedAt),
        UserSortBy::CreatedAt(Sort::Asc) => query.order_by_asc(users::Column::CreatedAt),
        UserSortBy::Email(Sort::Desc) => query.order_by_desc(users::Column::Email),
        UserSortBy::Email(Sort::Asc) => query.order_by_asc(users::Column::Email),
        UserSortBy::Name(Sort::Desc) => query.order_by_desc(users::Column::Name),
        UserSortBy::Name(Sort::Asc) => query.order_by_asc(users::Column::Name),
    }
}

fn user_condition(filter: &UserFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(email) = &filter.email {
        cond = cond.add(contains_ignore_case(users::Column::Email, email));
    }
    if let Some(name) = &filter.name {
        cond = cond.add(
            Condition::any()
                .add(contains_ignore_case(users::Column::Name, name))
                .add(contains_ignore_case(users::Column::DisplayName, name)),
        );
    }
    match filter.verified {
        Some(true) => cond.add(users::Column::EmailVerifiedAt.is_not_null()),
        Some(false) => cond.add(users::Column::EmailVerifiedAt.is_null()),
        None => cond,
    }
}

fn contains_ignore_case(column: users::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((users::Entity, column))))
        .like(like_pattern(&needle.to_lowercase()))
}

/// `%needle%` with LIKE wildcards in `needle` escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn key_expr(key: &UserKey) -> SimpleExpr {
    match key {
        UserKey::Id(id) => users::Column::Id.eq(id.clone()),
        UserKey::Email(email) => users::Column::Email.eq(email.clone()),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        name: row.name,
        display_name: row.display_name,
        avatar: row.avatar,
        gender: row.gender,
        birthday: row.birthday,
        email_verified_at: row.email_verified_at,
        login_at: row.login_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        display_name: model.display_name,
        avatar: model.avatar,
        gender: model.gender,
        birthday: model.birthday,
        email_verified_at: model.email_verified_at,
        login_at: model.login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
        description: model.description,
    }
}

fn permission_from_model(model: permissions::Model) -> Permission {
    Permission {
        id: model.id,
        name: model.name,
        code: model.code,
        description: model.description,
    }
}

// ── Resource repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbResourceRepository {
    pub db: DatabaseConnection,
}

impl ResourceRepository for DbResourceRepository {
    async fn list_by_permission_ids(
        &self,
        permission_ids: &[String],
    ) -> Result<Vec<Resource>, UsersServiceError> {
        let models = resources::Entity::find()
            .filter(
                resources::Column::Id.in_subquery(
                    Query::select()
                        .column(resource_permissions::Column::ResourceId)
                        .from(resource_permissions::Entity)
                        .and_where(
                            resource_permissions::Column::PermissionId
                                .is_in(permission_ids.iter().cloned()),
                        )
                        .to_owned(),
                ),
            )
            .order_by_asc(resources::Column::SortOrder)
            .order_by_asc(resources::Column::Id)
            .all(&self.db)
            .await
            .context("list resources by permission ids")?;
        Ok(models.into_iter().map(resource_from_model).collect())
    }
}

fn resource_from_model(model: resources::Model) -> Resource {
    Resource {
        id: model.id,
        name: model.name,
        path: model.path,
        icon: model.icon,
        parent_id: model.parent_id,
        sort_order: model.sort_order,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Account repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn update(
        &self,
        provider: &str,
        provider_account_id: &str,
        patch: &AccountPatch,
    ) -> Result<Account, UsersServiceError> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::Provider.eq(provider))
            .filter(accounts::Column::ProviderAccountId.eq(provider_account_id))
            .one(&self.db)
            .await
            .context("find account by provider")?
            .ok_or(UsersServiceError::AccountNotFound)?;

        let mut am = existing.into_active_model();
        if let Some(access_token) = &patch.access_token {
            am.access_token = Set(Some(access_token.clone()));
        }
        if let Some(refresh_token) = &patch.refresh_token {
            am.refresh_token = Set(Some(refresh_token.clone()));
        }
        if let Some(expires_at) = patch.expires_at {
            am.expires_at = Set(Some(expires_at));
        }
        if let Some(token_type) = &patch.token_type {
            am.token_type = Set(Some(token_type.clone()));
        }
        if let Some(scope) = &patch.scope {
            am.scope = Set(Some(scope.clone()));
        }
        if let Some(id_token) = &patch.id_token {
            am.id_token = Set(Some(id_token.clone()));
        }
        am.updated_at = Set(Utc::now());
        let model = am.update(&self.db).await.context("update account")?;
        Ok(account_from_model(model))
    }
}

fn account_from_model(model: accounts::Model) -> Account {
    Account {
        id: model.id,
        user_id: model.user_id,
        kind: model.kind,
        provider: model.provider,
        provider_account_id: model.provider_account_id,
        access_token: model.access_token,
        refresh_token: model.refresh_token,
        expires_at: model.expires_at,
        token_type: model.token_type,
        scope: model.scope,
        id_token: model.id_token,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
