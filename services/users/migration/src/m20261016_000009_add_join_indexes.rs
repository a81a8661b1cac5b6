use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .name("idx_accounts_user_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(UserRoles::Table)
                    .col(UserRoles::RoleId)
                    .name("idx_user_roles_role_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(RolePermissions::Table)
                    .col(RolePermissions::PermissionId)
                    .name("idx_role_permissions_permission_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(ResourcePermissions::Table)
                    .col(ResourcePermissions::PermissionId)
                    .name("idx_resource_permissions_permission_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_resource_permissions_permission_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_role_permissions_permission_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_roles_role_id").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_accounts_user_id").to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    UserId,
}

#[derive(Iden)]
enum UserRoles {
    Table,
    RoleId,
}

#[derive(Iden)]
enum RolePermissions {
    Table,
    PermissionId,
}

#[derive(Iden)]
enum ResourcePermissions {
    Table,
    PermissionId,
}
