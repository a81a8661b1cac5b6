use sea_orm_migration::prelude::*;

mod m20261016_000001_create_users;
mod m20261016_000002_create_accounts;
mod m20261016_000003_create_roles;
mod m20261016_000004_create_user_roles;
mod m20261016_000005_create_permissions;
mod m20261016_000006_create_role_permissions;
mod m20261016_000007_create_resources;
mod m20261016_000008_create_resource_permissions;
mod m20261016_000009_add_join_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_create_users::Migration),
            Box::new(m20261016_000002_create_accounts::Migration),
            Box::new(m20261016_000003_create_roles::Migration),
            Box::new(m20261016_000004_create_user_roles::Migration),
            Box::new(m20261016_000005_create_permissions::Migration),
            Box::new(m20261016_000006_create_role_permissions::Migration),
            Box::new(m20261016_000007_create_resources::Migration),
            Box::new(m20261016_000008_create_resource_permissions::Migration),
            Box::new(m20261016_000009_add_join_indexes::Migration),
        ]
    }
}
