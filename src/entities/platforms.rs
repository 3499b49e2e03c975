use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "platforms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Internal key, e.g. "netflix".
    #[sea_orm(unique)]
    pub key: String,
    pub name: String,
    /// The catalog API's source id. Platforms are created lazily by
    /// get-or-create on this value during sync.
    #[sea_orm(unique)]
    pub source_id: i32,
    pub logo_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_platforms::Entity")]
    ContentPlatforms,
}

impl Related<super::content_platforms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentPlatforms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
