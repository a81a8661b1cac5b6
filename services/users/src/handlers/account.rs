use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Account, AccountPatch};
use crate::error::UsersServiceError;
use crate::state::AppState;

/// Account as returned over HTTP. Provider tokens are not echoed back.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub provider: String,
    pub provider_account_id: String,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "keel_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            user_id: account.user_id,
            kind: account.kind,
            provider: account.provider,
            provider_account_id: account.provider_account_id,
            expires_at: account.expires_at,
            token_type: account.token_type,
            scope: account.scope,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

// ── PATCH /accounts/{provider}/{provider_account_id} ────────────────────────

#[derive(Deserialize, Default)]
pub struct UpdateAccountRequest {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

pub async fn update_account(
    State(state): State<AppState>,
    Path((provider, provider_account_id)): Path<(String, String)>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, UsersServiceError> {
    let account = state
        .user_service()
        .update_account(
            &provider,
            &provider_account_id,
            AccountPatch {
                access_token: body.access_token,
                refresh_token: body.refresh_token,
                expires_at: body.expires_at,
                token_type: body.token_type,
                scope: body.scope,
                id_token: body.id_token,
            },
        )
        .await?;
    Ok(Json(AccountResponse::from(account)))
}
