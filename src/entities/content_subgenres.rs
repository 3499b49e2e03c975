use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "content_subgenres")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub content_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subgenre_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contents::Entity",
        from = "Column::ContentId",
        to = "super::contents::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Content,
    #[sea_orm(
        belongs_to = "super::subgenres::Entity",
        from = "Column::SubgenreId",
        to = "super::subgenres::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Subgenre,
}

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl Related<super::subgenres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subgenre.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
