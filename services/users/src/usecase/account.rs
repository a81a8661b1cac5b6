use crate::domain::repository::AccountRepository;
use crate::domain::types::{Account, AccountPatch};
use crate::error::UsersServiceError;

/// Provider-account maintenance. Owns no logic beyond the repository call.
pub struct AccountService<A: AccountRepository> {
    pub repo: A,
}

impl<A: AccountRepository> AccountService<A> {
    pub async fn update(
        &self,
        provider: &str,
        provider_account_id: &str,
        patch: AccountPatch,
    ) -> Result<Account, UsersServiceError> {
        self.repo.update(provider, provider_account_id, &patch).await
    }
}
