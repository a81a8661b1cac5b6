use std::sync::atomic::Ordering;

use keel_users::error::UsersServiceError;

use crate::helpers::{
    MockResourceRepo, MockUserRepo, StoredUser, permission, resource, role, service, user,
};

fn alice_with_permissions(role_permissions: Vec<&str>) -> MockUserRepo {
    MockUserRepo::new(
        vec![StoredUser::new(user("u1", "alice@example.com"), &["member"])],
        vec![role(
            "member",
            role_permissions.into_iter().map(permission).collect(),
        )],
    )
}

#[tokio::test]
async fn should_resolve_resources_intersecting_user_permissions() {
    let resources = MockResourceRepo::new(vec![
        (resource("r1", 1), vec!["p1"]),
        (resource("r2", 2), vec!["p3"]),
        (resource("r3", 3), vec!["p2"]),
    ]);
    let svc = service(alice_with_permissions(vec!["p1", "p2"]), resources);

    let page = svc.find_user_resources("alice@example.com").await.unwrap();

    let ids: Vec<_> = page.items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r3"]);
    assert_eq!(page.total, 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, 2);
}

#[tokio::test]
async fn should_include_resources_in_detail_when_requested() {
    let resources = MockResourceRepo::new(vec![(resource("r1", 1), vec!["p1"])]);
    let svc = service(alice_with_permissions(vec!["p1"]), resources);

    let with = svc
        .find_by_email_x("alice@example.com", true)
        .await
        .unwrap()
        .unwrap();
    let without = svc
        .find_by_email_x("alice@example.com", false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(with.resources.len(), 1);
    assert!(without.resources.is_empty());
}

#[tokio::test]
async fn should_skip_resource_query_without_permissions() {
    let resources = MockResourceRepo::new(vec![(resource("r1", 1), vec!["p1"])]);
    let calls = resources.calls_handle();
    let svc = service(alice_with_permissions(vec![]), resources);

    let page = svc.find_user_resources("alice@example.com").await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_return_user_not_found_for_unknown_email() {
    let svc = service(MockUserRepo::empty(), MockResourceRepo::empty());
    let result = svc.find_user_resources("ghost@example.com").await;
    assert!(matches!(result, Err(UsersServiceError::UserNotFound)));
}
