use serde::{Deserialize, Serialize};

/// A fully hydrated catalog entry: the content row plus its platform
/// badges, subgenre tags, and resolved primary subgenre.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    pub critics_rating: Option<f64>,
    pub users_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub content_type: String,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub watchmode_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    pub hidden: bool,
    pub active: bool,
    pub primary_subgenre: Option<SubgenreTag>,
    pub subgenres: Vec<SubgenreTag>,
    pub platforms: Vec<PlatformBadge>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgenreTag {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// A platform chip shown on browse/detail views, carrying the per-platform
/// link data from the join row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformBadge {
    pub platform_id: i32,
    pub key: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub web_url: Option<String>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
}

/// Input for inserting a content row (admin create or sync persistence).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub release_year: Option<i32>,
    pub critics_rating: Option<f64>,
    pub users_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub content_type: String,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub watchmode_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub hidden: bool,
    pub watchmode_data: Option<String>,
}

/// Partial update for the admin PATCH path. `None` leaves a field alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub critics_rating: Option<f64>,
    pub users_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub content_type: Option<String>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    pub active: Option<bool>,
}

/// Input for a content-platform link row.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformLinkInput {
    pub platform_id: i32,
    pub web_url: Option<String>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
}
