use sea_orm::entity::prelude::*;

/// Navigable menu item; visibility is gated by `resource_permissions`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_permissions::Entity")]
    ResourcePermissions,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Parent,
}

impl Related<super::resource_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourcePermissions.def()
    }
}

impl Related<super::permissions::Entity> for Entity {
    fn to() -> RelationDef {
        super::resource_permissions::Relation::Permission.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::resource_permissions::Relation::Resource.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
