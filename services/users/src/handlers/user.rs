use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use keel_domain::pagination::{Page, PageRequest};

use crate::domain::types::{Resource, User, UserFilter, UserListQuery, UserProfile, UserSortBy};
use crate::error::UsersServiceError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::user::{CreateUserInput, NewAccountInput, UpdateUserInput};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms_opt")]
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms_opt")]
    pub login_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
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
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms_opt")]
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms_opt")]
    pub login_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            display_name: profile.display_name,
            avatar: profile.avatar,
            gender: profile.gender,
            birthday: profile.birthday,
            email_verified_at: profile.email_verified_at,
            login_at: profile.login_at,
            roles: profile.role_names,
            permissions: profile.permission_names,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: i32,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            path: resource.path,
            icon: resource.icon,
            parent_id: resource.parent_id,
            sort_order: resource.sort_order,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "password1")]
    pub password_confirmation: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub account: CreateAccountRequest,
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
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

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), UsersServiceError> {
    let account = body.account;
    let user = state
        .user_service()
        .create(
            CreateUserInput {
                email: body.email,
                password: body.password,
                password_confirmation: body.password_confirmation,
                name: body.name,
                display_name: body.display_name,
                avatar: body.avatar,
                gender: body.gender,
                birthday: body.birthday,
            },
            NewAccountInput {
                kind: account.kind,
                provider: account.provider,
                provider_account_id: account.provider_account_id,
                access_token: account.access_token,
                refresh_token: account.refresh_token,
                expires_at: account.expires_at,
                token_type: account.token_type,
                scope: account.scope,
                id_token: account.id_token,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// ── GET /users ───────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct UserListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub verified: Option<bool>,
    pub sort_by: Option<String>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        let defaults = PageRequest::default();
        Self {
            filter: UserFilter {
                email: params.email.filter(|s| !s.is_empty()),
                name: params.name.filter(|s| !s.is_empty()),
                verified: params.verified,
            },
            sort_by: params
                .sort_by
                .as_deref()
                .and_then(UserSortBy::from_kebab_case)
                .unwrap_or_default(),
            page: PageRequest {
                page: params.page.unwrap_or(defaults.page),
                limit: params.limit.unwrap_or(defaults.limit),
            },
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Page<UserResponse>>, UsersServiceError> {
    let params: UserListParams = parse_query(raw_query.as_deref())?;
    let page = state.user_service().find_all(params.into()).await?;
    Ok(Json(page.map(UserResponse::from)))
}

// ── GET /users/{id} ──────────────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, UsersServiceError> {
    let user = state
        .user_service()
        .find_one(&id)
        .await?
        .ok_or(UsersServiceError::UserNotFound)?;
    Ok(Json(UserResponse::from(user)))
}

// ── PATCH /users/{id} ────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "password1")]
    pub password_confirmation: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, UsersServiceError> {
    let user = state
        .user_service()
        .update(
            &id,
            UpdateUserInput {
                email: body.email,
                password: body.password,
                password_confirmation: body.password_confirmation,
                name: body.name,
                display_name: body.display_name,
                avatar: body.avatar,
                gender: body.gender,
                birthday: body.birthday,
            },
        )
        .await?;
    Ok(Json(UserResponse::from(user)))
}

// ── DELETE /users/{id} ───────────────────────────────────────────────────────

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, UsersServiceError> {
    let user = state.user_service().remove(&id).await?;
    Ok(Json(UserResponse::from(user)))
}

// ── GET /users/{id}/profile ──────────────────────────────────────────────────

pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfileResponse>, UsersServiceError> {
    let profile = state
        .user_service()
        .get_user_profile_by_id(&id)
        .await?
        .ok_or(UsersServiceError::UserNotFound)?;
    Ok(Json(UserProfileResponse::from(profile)))
}

// ── POST /users/verify-email ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<UserResponse>, UsersServiceError> {
    if body.email.trim().is_empty() {
        return Err(UsersServiceError::MissingData);
    }
    let user = state.user_service().verify_email(&body.email).await?;
    Ok(Json(UserResponse::from(user)))
}

// ── GET /users/resources ─────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct UserResourcesParams {
    pub email: Option<String>,
}

pub async fn get_user_resources(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Page<ResourceResponse>>, UsersServiceError> {
    let params: UserResourcesParams = parse_query(raw_query.as_deref())?;
    let email = params
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or(UsersServiceError::MissingData)?;
    let page = state.user_service().find_user_resources(&email).await?;
    Ok(Json(page.map(ResourceResponse::from)))
}
