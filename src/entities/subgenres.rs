use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subgenres")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    /// Admin-controlled display order on browse pages.
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_subgenres::Entity")]
    ContentSubgenres,
}

impl Related<super::content_subgenres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentSubgenres.def()
    }
}

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        super::content_subgenres::Relation::Content.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::content_subgenres::Relation::Subgenre.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
