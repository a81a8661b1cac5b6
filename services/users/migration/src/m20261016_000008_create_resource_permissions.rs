use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResourcePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourcePermissions::ResourceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourcePermissions::PermissionId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ResourcePermissions::ResourceId)
                            .col(ResourcePermissions::PermissionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ResourcePermissions::Table, ResourcePermissions::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ResourcePermissions::Table, ResourcePermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResourcePermissions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ResourcePermissions {
    Table,
    ResourceId,
    PermissionId,
}

#[derive(Iden)]
enum Resources {
    Table,
    Id,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Id,
}
