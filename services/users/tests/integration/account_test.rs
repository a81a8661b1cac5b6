use keel_users::domain::types::AccountPatch;
use keel_users::error::UsersServiceError;

use crate::helpers::{
    MockAccountRepo, MockResourceRepo, MockUserRepo, account, at, service_with_accounts,
};

#[tokio::test]
async fn should_update_only_given_token_fields() {
    let svc = service_with_accounts(
        MockUserRepo::empty(),
        MockResourceRepo::empty(),
        MockAccountRepo::new(vec![account("github", "gh-1", "u1")]),
    );

    let updated = svc
        .update_account(
            "github",
            "gh-1",
            AccountPatch {
                access_token: Some("new-access".into()),
                expires_at: Some(200),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.access_token.as_deref(), Some("new-access"));
    assert_eq!(updated.expires_at, Some(200));
    assert_eq!(updated.refresh_token.as_deref(), Some("old-refresh"));
    assert_eq!(updated.token_type.as_deref(), Some("bearer"));
    assert!(updated.updated_at > at(0));
}

#[tokio::test]
async fn should_return_account_not_found_for_unknown_provider_pair() {
    let svc = service_with_accounts(
        MockUserRepo::empty(),
        MockResourceRepo::empty(),
        MockAccountRepo::new(vec![account("github", "gh-1", "u1")]),
    );

    let result = svc
        .update_account("github", "gh-2", AccountPatch::default())
        .await;

    assert!(matches!(result, Err(UsersServiceError::AccountNotFound)));
}
