use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    /// Critic and user scores on a 0-10 scale, independently nullable.
    pub critics_rating: Option<f64>,
    pub users_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    /// JSON string array of subgenre names. Derived projection of the
    /// content_subgenres join rows; never written independently.
    pub subgenre_names: Option<String>,
    pub primary_subgenre_id: Option<i32>,
    /// "movie" or "series". Seasons/episodes are meaningful only for series.
    pub content_type: String,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub watchmode_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    /// Admin-curated "don't show publicly"; wins over active.
    pub hidden: Option<bool>,
    pub active: bool,
    /// Raw external payload snapshot, kept to avoid re-fetching.
    pub watchmode_data: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subgenres::Entity",
        from = "Column::PrimarySubgenreId",
        to = "super::subgenres::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    PrimarySubgenre,
    #[sea_orm(has_many = "super::content_platforms::Entity")]
    ContentPlatforms,
    #[sea_orm(has_many = "super::watchlist::Entity")]
    Watchlist,
}

impl Related<super::content_platforms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentPlatforms.def()
    }
}

impl Related<super::subgenres::Entity> for Entity {
    fn to() -> RelationDef {
        super::content_subgenres::Relation::Subgenre.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::content_subgenres::Relation::Content.def().rev())
    }
}

impl Related<super::watchlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Watchlist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
