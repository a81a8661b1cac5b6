use std::sync::atomic::Ordering;

use keel_domain::pagination::{PageRequest, Sort};
use keel_users::domain::types::{UserFilter, UserKey, UserListQuery, UserSortBy};
use keel_users::error::UsersServiceError;
use keel_users::usecase::user::UpdateUserInput;

use crate::helpers::{
    DEFAULT_ROLE_ID, MockResourceRepo, MockUserRepo, StoredUser, at, create_input,
    credentials_account, permission, role, service, user,
};

// ── create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_user_with_hashed_password_account_and_default_role() {
    let repo = MockUserRepo::empty();
    let users = repo.users_handle();
    let accounts = repo.accounts_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let created = svc
        .create(
            create_input("alice@example.com", "secret"),
            credentials_account("alice@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(created.email, "alice@example.com");
    assert_eq!(created.display_name.as_deref(), Some("Alice"));
    assert!(!created.is_email_verified());

    let stored = users.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].password, "hashed:secret");
    assert_eq!(stored[0].role_ids, vec![DEFAULT_ROLE_ID.to_owned()]);

    let accounts = accounts.lock().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].provider, "credentials");
    assert_eq!(accounts[0].provider_account_id, "alice@example.com");
}

#[tokio::test]
async fn should_reject_create_when_email_taken_without_writing() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let accounts = repo.accounts_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let result = svc
        .create(
            create_input("alice@example.com", "secret"),
            credentials_account("alice@example.com"),
        )
        .await;

    assert!(matches!(result, Err(UsersServiceError::UserAlreadyExists)));
    assert_eq!(users.lock().unwrap().len(), 1);
    assert!(accounts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_surface_lost_create_race_as_user_already_exists() {
    let mut repo = MockUserRepo::empty();
    repo.lose_create_race = true;
    let svc = service(repo, MockResourceRepo::empty());

    let result = svc
        .create(
            create_input("alice@example.com", "secret"),
            credentials_account("alice@example.com"),
        )
        .await;

    assert!(matches!(result, Err(UsersServiceError::UserAlreadyExists)));
}

#[tokio::test]
async fn should_reject_create_with_mismatched_confirmation() {
    let repo = MockUserRepo::empty();
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let mut input = create_input("alice@example.com", "secret");
    input.password_confirmation = Some("other".into());
    let result = svc
        .create(input, credentials_account("alice@example.com"))
        .await;

    assert!(matches!(result, Err(UsersServiceError::PasswordMismatch)));
    assert!(users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_create_with_empty_password() {
    let svc = service(MockUserRepo::empty(), MockResourceRepo::empty());
    let result = svc
        .create(
            create_input("alice@example.com", ""),
            credentials_account("alice@example.com"),
        )
        .await;
    assert!(matches!(result, Err(UsersServiceError::InvalidPassword)));
}

// ── find_all ─────────────────────────────────────────────────────────────────

fn seeded_repo() -> MockUserRepo {
    let mut users = Vec::new();
    for i in 0..5 {
        let mut u = user(&format!("u{i}"), &format!("user{i}@example.com"));
        u.created_at = at(i);
        u.name = Some(format!("user-{i}"));
        if i % 2 == 0 {
            u.email_verified_at = Some(at(10));
        }
        users.push(StoredUser::new(u, &[]));
    }
    MockUserRepo::new(users, vec![])
}

#[tokio::test]
async fn should_report_filtered_total_beyond_page() {
    let svc = service(seeded_repo(), MockResourceRepo::empty());

    let page = svc
        .find_all(UserListQuery {
            page: PageRequest { page: 1, limit: 2 },
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 2);
    // Newest first by default.
    assert_eq!(page.items[0].id, "u4");
    assert_eq!(page.items[1].id, "u3");
}

#[tokio::test]
async fn should_filter_and_sort_list() {
    let svc = service(seeded_repo(), MockResourceRepo::empty());

    let page = svc
        .find_all(UserListQuery {
            filter: UserFilter {
                verified: Some(true),
                ..Default::default()
            },
            sort_by: UserSortBy::Email(Sort::Asc),
            page: PageRequest::default(),
        })
        .await
        .unwrap();

    let ids: Vec<_> = page.items.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u0", "u2", "u4"]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn should_clamp_out_of_range_page_request() {
    let svc = service(seeded_repo(), MockResourceRepo::empty());

    let page = svc
        .find_all(UserListQuery {
            page: PageRequest { page: 0, limit: 0 },
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 5);
}

// ── find ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_find_one_and_by_email() {
    let svc = service(seeded_repo(), MockResourceRepo::empty());

    assert_eq!(svc.find_one("u1").await.unwrap().unwrap().id, "u1");
    assert_eq!(
        svc.find_by_email("user2@example.com")
            .await
            .unwrap()
            .unwrap()
            .id,
        "u2"
    );
    assert!(svc.find_one("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn should_return_none_for_unknown_user_key() {
    let svc = service(MockUserRepo::empty(), MockResourceRepo::empty());
    let result = svc
        .find_user(&UserKey::Email("ghost@example.com".into()), true)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn should_flatten_roles_and_permissions_in_role_order() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(
            user("u1", "alice@example.com"),
            &["admin", "member"],
        )],
        vec![
            role("member", vec![permission("p1")]),
            role("admin", vec![permission("p2"), permission("p1")]),
        ],
    );
    let svc = service(repo, MockResourceRepo::empty());

    let detail = svc.find_by_id_x("u1", false).await.unwrap().unwrap();

    assert_eq!(detail.role_names, vec!["admin-name", "member-name"]);
    assert_eq!(
        detail.permission_names,
        vec!["p2-name", "p1-name", "p1-name"]
    );
    assert_eq!(detail.password, "hashed:secret");
    assert!(detail.resources.is_empty());
}

// ── profile ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_project_profile_by_email_and_id() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &["member"])],
        vec![role("member", vec![permission("p1")])],
    );
    let svc = service(repo, MockResourceRepo::empty());

    let by_email = svc
        .get_user_profile_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    let by_id = svc.get_user_profile_by_id("u1").await.unwrap().unwrap();

    assert_eq!(by_email, by_id);
    assert_eq!(by_id.role_names, vec!["member-name"]);
    assert_eq!(by_id.permission_names, vec!["p1-name"]);
    assert!(svc.get_user_profile_by_id("ghost").await.unwrap().is_none());
}

// ── update ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_blank_id_before_touching_repository() {
    let repo = MockUserRepo::empty();
    let calls = repo.calls_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let result = svc.update("   ", UpdateUserInput::default()).await;

    assert!(matches!(result, Err(UsersServiceError::InvalidId)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_hash_password_on_update_without_confirmation() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    svc.update(
        "u1",
        UpdateUserInput {
            password: Some("new-secret".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(users.lock().unwrap()[0].password, "hashed:new-secret");
}

#[tokio::test]
async fn should_hash_password_on_update_with_matching_confirmation() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    svc.update(
        "u1",
        UpdateUserInput {
            password: Some("new-secret".into()),
            password_confirmation: Some("new-secret".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(users.lock().unwrap()[0].password, "hashed:new-secret");
}

#[tokio::test]
async fn should_reject_mismatched_confirmation_on_update() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let result = svc
        .update(
            "u1",
            UpdateUserInput {
                password: Some("new-secret".into()),
                password_confirmation: Some("typo".into()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(UsersServiceError::PasswordMismatch)));
    assert_eq!(users.lock().unwrap()[0].password, "hashed:secret");
}

#[tokio::test]
async fn should_leave_password_untouched_when_absent() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let updated = svc
        .update(
            "u1",
            UpdateUserInput {
                display_name: Some("Al".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.display_name.as_deref(), Some("Al"));
    assert!(updated.updated_at > at(0));
    assert_eq!(users.lock().unwrap()[0].password, "hashed:secret");
}

#[tokio::test]
async fn should_return_user_not_found_when_updating_unknown_id() {
    let svc = service(MockUserRepo::empty(), MockResourceRepo::empty());
    let result = svc
        .update(
            "ghost",
            UpdateUserInput {
                name: Some("x".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UsersServiceError::UserNotFound)));
}

// ── remove ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_remove_user_and_return_projection() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let users = repo.users_handle();
    let svc = service(repo, MockResourceRepo::empty());

    let removed = svc.remove("u1").await.unwrap();

    assert_eq!(removed.id, "u1");
    assert!(users.lock().unwrap().is_empty());
    assert!(matches!(
        svc.remove("u1").await,
        Err(UsersServiceError::UserNotFound)
    ));
}

// ── verify_email ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_email_once() {
    let repo = MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &[])],
        vec![],
    );
    let svc = service(repo, MockResourceRepo::empty());

    let first = svc.verify_email("alice@example.com").await.unwrap();
    let verified_at = first.email_verified_at.unwrap();

    let second = svc.verify_email("alice@example.com").await.unwrap();

    assert_eq!(second.email_verified_at, Some(verified_at));
    assert_eq!(second, first);
}

#[tokio::test]
async fn should_reject_verification_of_unregistered_email() {
    let svc = service(MockUserRepo::empty(), MockResourceRepo::empty());
    let result = svc.verify_email("ghost@example.com").await;
    assert!(matches!(result, Err(UsersServiceError::EmailNotRegistered)));
}
