use std::collections::HashMap;

use anyhow::Result;
use sea_orm::sea_query::{Condition, Expr, Func, NullOrdering, OnConflict, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{
    content_platforms, content_subgenres, contents, platforms, prelude::*, subgenres,
};
use crate::models::content::{
    ContentPatch, ContentRecord, NewContent, PlatformBadge, SubgenreTag,
};
use crate::query::{FilterSpec, OrderSpec, Predicate, SortDirection, SortField};

pub struct ContentRepository {
    conn: DatabaseConnection,
}

impl ContentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ===== Filtered listing =====

    /// Fetch the base row set for a compiled filter spec, then hydrate
    /// platform badges, subgenre tags, and primary subgenres with batched
    /// secondary queries keyed by the result id set.
    pub async fn list(&self, spec: &FilterSpec) -> Result<Vec<ContentRecord>> {
        let mut select = Contents::find();
        for predicate in &spec.predicates {
            select = select.filter(predicate_condition(predicate));
        }
        let rows = apply_order(select, spec.order).all(&self.conn).await?;
        self.hydrate(rows).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<ContentRecord>> {
        let Some(row) = Contents::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.into_iter().next())
    }

    pub async fn get_model(&self, id: i32) -> Result<Option<contents::Model>> {
        Ok(Contents::find_by_id(id).one(&self.conn).await?)
    }

    async fn hydrate(&self, rows: Vec<contents::Model>) -> Result<Vec<ContentRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();

        let mut platform_map: HashMap<i32, Vec<PlatformBadge>> = HashMap::new();
        let links = ContentPlatforms::find()
            .filter(content_platforms::Column::ContentId.is_in(ids.clone()))
            .find_also_related(Platforms)
            .all(&self.conn)
            .await?;
        for (link, platform) in links {
            let Some(platform) = platform else { continue };
            platform_map
                .entry(link.content_id)
                .or_default()
                .push(PlatformBadge {
                    platform_id: platform.id,
                    key: platform.key,
                    name: platform.name,
                    logo_url: platform.logo_url,
                    web_url: link.web_url,
                    seasons: link.seasons,
                    episodes: link.episodes,
                });
        }

        let mut subgenre_map: HashMap<i32, Vec<SubgenreTag>> = HashMap::new();
        let tags = ContentSubgenres::find()
            .filter(content_subgenres::Column::ContentId.is_in(ids))
            .find_also_related(Subgenres)
            .all(&self.conn)
            .await?;
        for (join, subgenre) in tags {
            let Some(subgenre) = subgenre else { continue };
            subgenre_map
                .entry(join.content_id)
                .or_default()
                .push(SubgenreTag {
                    id: subgenre.id,
                    name: subgenre.name,
                    slug: subgenre.slug,
                });
        }

        let primary_ids: Vec<i32> = rows.iter().filter_map(|m| m.primary_subgenre_id).collect();
        let mut primary_map: HashMap<i32, SubgenreTag> = HashMap::new();
        if !primary_ids.is_empty() {
            for subgenre in Subgenres::find()
                .filter(subgenres::Column::Id.is_in(primary_ids))
                .all(&self.conn)
                .await?
            {
                primary_map.insert(
                    subgenre.id,
                    SubgenreTag {
                        id: subgenre.id,
                        name: subgenre.name,
                        slug: subgenre.slug,
                    },
                );
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let primary_subgenre = row
                    .primary_subgenre_id
                    .and_then(|id| primary_map.get(&id).cloned());
                ContentRecord {
                    id: row.id,
                    title: row.title,
                    release_year: row.release_year,
                    critics_rating: row.critics_rating,
                    users_rating: row.users_rating,
                    average_rating: row.average_rating,
                    description: row.description,
                    poster_url: row.poster_url,
                    content_type: row.content_type,
                    seasons: row.seasons,
                    episodes: row.episodes,
                    watchmode_id: row.watchmode_id,
                    imdb_id: row.imdb_id,
                    tmdb_id: row.tmdb_id,
                    hidden: row.hidden.unwrap_or(false),
                    active: row.active,
                    primary_subgenre,
                    subgenres: subgenre_map.remove(&row.id).unwrap_or_default(),
                    platforms: platform_map.remove(&row.id).unwrap_or_default(),
                    created_at: row.created_at,
                }
            })
            .collect())
    }

    // ===== CRUD =====

    pub async fn create(&self, input: &NewContent) -> Result<contents::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let active = contents::ActiveModel {
            id: NotSet,
            title: Set(input.title.clone()),
            release_year: Set(input.release_year),
            critics_rating: Set(input.critics_rating),
            users_rating: Set(input.users_rating),
            average_rating: Set(input.average_rating),
            description: Set(input.description.clone()),
            poster_url: Set(input.poster_url.clone()),
            subgenre_names: Set(None),
            primary_subgenre_id: Set(None),
            content_type: Set(input.content_type.clone()),
            seasons: Set(input.seasons),
            episodes: Set(input.episodes),
            watchmode_id: Set(input.watchmode_id),
            imdb_id: Set(input.imdb_id.clone()),
            tmdb_id: Set(input.tmdb_id),
            hidden: Set(Some(input.hidden)),
            active: Set(true),
            watchmode_data: Set(input.watchmode_data.clone()),
            created_at: Set(Some(now.clone())),
            updated_at: Set(Some(now)),
        };
        let model = active.insert(&self.conn).await?;
        info!(id = model.id, title = %model.title, "Added content");
        Ok(model)
    }

    pub async fn update(&self, id: i32, patch: &ContentPatch) -> Result<Option<contents::Model>> {
        let Some(model) = Contents::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut active: contents::ActiveModel = model.into();
        if let Some(v) = &patch.title {
            active.title = Set(v.clone());
        }
        if let Some(v) = patch.release_year {
            active.release_year = Set(Some(v));
        }
        if let Some(v) = patch.critics_rating {
            active.critics_rating = Set(Some(v));
        }
        if let Some(v) = patch.users_rating {
            active.users_rating = Set(Some(v));
        }
        if let Some(v) = patch.average_rating {
            active.average_rating = Set(Some(v));
        }
        if let Some(v) = &patch.description {
            active.description = Set(Some(v.clone()));
        }
        if let Some(v) = &patch.poster_url {
            active.poster_url = Set(Some(v.clone()));
        }
        if let Some(v) = &patch.content_type {
            active.content_type = Set(v.clone());
        }
        if let Some(v) = patch.seasons {
            active.seasons = Set(Some(v));
        }
        if let Some(v) = patch.episodes {
            active.episodes = Set(Some(v));
        }
        if let Some(v) = &patch.imdb_id {
            active.imdb_id = Set(Some(v.clone()));
        }
        if let Some(v) = patch.tmdb_id {
            active.tmdb_id = Set(Some(v));
        }
        if let Some(v) = patch.active {
            active.active = Set(v);
        }
        active.updated_at = Set(Some(chrono::Utc::now().to_rfc3339()));
        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Contents::delete_by_id(id).exec(&self.conn).await?;
        let removed = result.rows_affected > 0;
        if removed {
            info!(id, "Removed content");
        }
        Ok(removed)
    }

    pub async fn set_hidden(&self, id: i32, hidden: bool) -> Result<bool> {
        let result = Contents::update_many()
            .col_expr(contents::Column::Hidden, Expr::value(hidden))
            .col_expr(
                contents::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(contents::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ===== Dedup lookups (local only, no API cost) =====

    pub async fn find_by_watchmode_id(&self, watchmode_id: i64) -> Result<Option<contents::Model>> {
        Ok(Contents::find()
            .filter(contents::Column::WatchmodeId.eq(watchmode_id))
            .one(&self.conn)
            .await?)
    }

    /// Case-insensitive exact title match with release year within ±1,
    /// guarding against off-by-one year discrepancies between catalogs.
    pub async fn find_by_title_year(
        &self,
        title: &str,
        year: i32,
    ) -> Result<Option<contents::Model>> {
        Ok(Contents::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(contents::Column::Title)))
                    .eq(title.to_lowercase()),
            )
            .filter(contents::Column::ReleaseYear.between(year - 1, year + 1))
            .one(&self.conn)
            .await?)
    }

    // ===== Subgenre assignment =====

    pub async fn subgenres_for(&self, content_id: i32) -> Result<Vec<SubgenreTag>> {
        let tags = ContentSubgenres::find()
            .filter(content_subgenres::Column::ContentId.eq(content_id))
            .find_also_related(Subgenres)
            .all(&self.conn)
            .await?;
        Ok(tags
            .into_iter()
            .filter_map(|(_, s)| s)
            .map(|s| SubgenreTag {
                id: s.id,
                name: s.name,
                slug: s.slug,
            })
            .collect())
    }

    /// Replace the full subgenre set. Clears the primary if it falls out of
    /// the new set, then refreshes the denormalized name projection.
    pub async fn set_subgenres(&self, content_id: i32, subgenre_ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;

        ContentSubgenres::delete_many()
            .filter(content_subgenres::Column::ContentId.eq(content_id))
            .exec(&txn)
            .await?;

        if !subgenre_ids.is_empty() {
            let rows: Vec<content_subgenres::ActiveModel> = subgenre_ids
                .iter()
                .map(|&subgenre_id| content_subgenres::ActiveModel {
                    content_id: Set(content_id),
                    subgenre_id: Set(subgenre_id),
                })
                .collect();
            ContentSubgenres::insert_many(rows).exec(&txn).await?;
        }

        if let Some(content) = Contents::find_by_id(content_id).one(&txn).await?
            && let Some(primary) = content.primary_subgenre_id
            && !subgenre_ids.contains(&primary)
        {
            let mut active: contents::ActiveModel = content.into();
            active.primary_subgenre_id = Set(None);
            active.update(&txn).await?;
        }

        refresh_subgenre_names(&txn, content_id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn add_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<()> {
        let txn = self.conn.begin().await?;
        ContentSubgenres::insert(content_subgenres::ActiveModel {
            content_id: Set(content_id),
            subgenre_id: Set(subgenre_id),
        })
        .on_conflict(
            OnConflict::columns([
                content_subgenres::Column::ContentId,
                content_subgenres::Column::SubgenreId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await?;
        refresh_subgenre_names(&txn, content_id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn remove_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;
        let result = ContentSubgenres::delete_many()
            .filter(content_subgenres::Column::ContentId.eq(content_id))
            .filter(content_subgenres::Column::SubgenreId.eq(subgenre_id))
            .exec(&txn)
            .await?;

        // A removed tag cannot stay primary.
        Contents::update_many()
            .col_expr(contents::Column::PrimarySubgenreId, Expr::value(Option::<i32>::None))
            .filter(contents::Column::Id.eq(content_id))
            .filter(contents::Column::PrimarySubgenreId.eq(subgenre_id))
            .exec(&txn)
            .await?;

        refresh_subgenre_names(&txn, content_id).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Set the primary subgenre, inserting the join row if it is missing so
    /// the primary always appears in the many-to-many set.
    pub async fn set_primary_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<()> {
        let txn = self.conn.begin().await?;
        ContentSubgenres::insert(content_subgenres::ActiveModel {
            content_id: Set(content_id),
            subgenre_id: Set(subgenre_id),
        })
        .on_conflict(
            OnConflict::columns([
                content_subgenres::Column::ContentId,
                content_subgenres::Column::SubgenreId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await?;

        Contents::update_many()
            .col_expr(contents::Column::PrimarySubgenreId, Expr::value(subgenre_id))
            .filter(contents::Column::Id.eq(content_id))
            .exec(&txn)
            .await?;

        refresh_subgenre_names(&txn, content_id).await?;
        txn.commit().await?;
        Ok(())
    }

    // ===== Platform links =====

    pub async fn platform_links_for(
        &self,
        content_id: i32,
    ) -> Result<Vec<(content_platforms::Model, Option<platforms::Model>)>> {
        Ok(ContentPlatforms::find()
            .filter(content_platforms::Column::ContentId.eq(content_id))
            .find_also_related(Platforms)
            .all(&self.conn)
            .await?)
    }

    /// Upsert a content-platform link; (content_id, platform_id) is unique.
    pub async fn upsert_platform_link(
        &self,
        content_id: i32,
        platform_id: i32,
        web_url: Option<&str>,
        seasons: Option<i32>,
        episodes: Option<i32>,
    ) -> Result<()> {
        ContentPlatforms::insert(content_platforms::ActiveModel {
            id: NotSet,
            content_id: Set(content_id),
            platform_id: Set(platform_id),
            web_url: Set(web_url.map(ToString::to_string)),
            seasons: Set(seasons),
            episodes: Set(episodes),
        })
        .on_conflict(
            OnConflict::columns([
                content_platforms::Column::ContentId,
                content_platforms::Column::PlatformId,
            ])
            .update_columns([
                content_platforms::Column::WebUrl,
                content_platforms::Column::Seasons,
                content_platforms::Column::Episodes,
            ])
            .to_owned(),
        )
        .exec(&self.conn)
        .await?;
        Ok(())
    }

    pub async fn remove_platform_link(&self, content_id: i32, platform_id: i32) -> Result<bool> {
        let result = ContentPlatforms::delete_many()
            .filter(content_platforms::Column::ContentId.eq(content_id))
            .filter(content_platforms::Column::PlatformId.eq(platform_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

/// Rewrite the denormalized subgenre-name array from the join rows. The
/// join table is the source of truth; this column is only a read-path
/// projection for listing pages.
async fn refresh_subgenre_names<C: sea_orm::ConnectionTrait>(
    conn: &C,
    content_id: i32,
) -> Result<()> {
    let names: Vec<String> = ContentSubgenres::find()
        .filter(content_subgenres::Column::ContentId.eq(content_id))
        .find_also_related(Subgenres)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(_, s)| s.map(|s| s.name))
        .collect();

    let value = if names.is_empty() {
        None
    } else {
        serde_json::to_string(&names).ok()
    };

    Contents::update_many()
        .col_expr(contents::Column::SubgenreNames, Expr::value(value))
        .filter(contents::Column::Id.eq(content_id))
        .exec(conn)
        .await?;
    Ok(())
}

// ===== FilterSpec translation =====

fn lower_like<C: sea_orm::sea_query::IntoColumnRef>(col: C, term: &str) -> Condition {
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(col))).like(format!("%{}%", term.to_lowercase())),
    )
}

/// EXISTS subquery over content_platforms, correlated on the outer content
/// row, with an extra platform-id restriction.
fn platform_id_exists(platform_id: i32) -> Condition {
    let sub = Query::select()
        .expr(Expr::val(1))
        .from(ContentPlatforms)
        .and_where(
            Expr::col((ContentPlatforms, content_platforms::Column::ContentId))
                .equals((Contents, contents::Column::Id)),
        )
        .and_where(
            Expr::col((ContentPlatforms, content_platforms::Column::PlatformId)).eq(platform_id),
        )
        .to_owned();
    Condition::all().add(Expr::exists(sub))
}

/// EXISTS over the platform join matched by internal key or display name,
/// case-sensitively.
fn platform_name_exists(names: &[String]) -> Condition {
    let sub = Query::select()
        .expr(Expr::val(1))
        .from(ContentPlatforms)
        .inner_join(
            Platforms,
            Expr::col((Platforms, platforms::Column::Id))
                .equals((ContentPlatforms, content_platforms::Column::PlatformId)),
        )
        .and_where(
            Expr::col((ContentPlatforms, content_platforms::Column::ContentId))
                .equals((Contents, contents::Column::Id)),
        )
        .cond_where(
            Condition::any()
                .add(Expr::col((Platforms, platforms::Column::Key)).is_in(names.to_vec()))
                .add(Expr::col((Platforms, platforms::Column::Name)).is_in(names.to_vec())),
        )
        .to_owned();
    Condition::all().add(Expr::exists(sub))
}

/// EXISTS over the many-to-many subgenre join with an arbitrary restriction
/// on the subgenre row.
fn m2m_subgenre_exists(subgenre_cond: Condition) -> Condition {
    let sub = Query::select()
        .expr(Expr::val(1))
        .from(ContentSubgenres)
        .inner_join(
            Subgenres,
            Expr::col((Subgenres, subgenres::Column::Id))
                .equals((ContentSubgenres, content_subgenres::Column::SubgenreId)),
        )
        .and_where(
            Expr::col((ContentSubgenres, content_subgenres::Column::ContentId))
                .equals((Contents, contents::Column::Id)),
        )
        .cond_where(subgenre_cond)
        .to_owned();
    Condition::all().add(Expr::exists(sub))
}

/// EXISTS against the subgenre row referenced by primary_subgenre_id.
fn primary_subgenre_exists(subgenre_cond: Condition) -> Condition {
    let sub = Query::select()
        .expr(Expr::val(1))
        .from(Subgenres)
        .and_where(
            Expr::col((Subgenres, subgenres::Column::Id))
                .equals((Contents, contents::Column::PrimarySubgenreId)),
        )
        .cond_where(subgenre_cond)
        .to_owned();
    Condition::all().add(Expr::exists(sub))
}

fn subgenre_name_or_slug_matches(term: &str) -> Condition {
    let like = format!("%{}%", term.to_lowercase());
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col((Subgenres, subgenres::Column::Name)))).like(like.clone()))
        .add(Expr::expr(Func::lower(Expr::col((Subgenres, subgenres::Column::Slug)))).like(like))
}

/// Slug exact-match or name substring, the subgenre-token semantics.
fn subgenre_token_matches(token: &str) -> Condition {
    Condition::any()
        .add(Expr::col((Subgenres, subgenres::Column::Slug)).eq(token))
        .add(
            Expr::expr(Func::lower(Expr::col((Subgenres, subgenres::Column::Name))))
                .like(format!("%{}%", token.to_lowercase())),
        )
}

fn predicate_condition(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::NotHidden => Condition::any()
            .add(contents::Column::Hidden.eq(false))
            .add(contents::Column::Hidden.is_null()),
        Predicate::ActiveOnly => Condition::all().add(contents::Column::Active.eq(true)),
        Predicate::PlatformIdAny(ids) => {
            let mut cond = Condition::any();
            for &id in ids {
                cond = cond.add(platform_id_exists(id));
            }
            cond
        }
        Predicate::PlatformIdAll(ids) => {
            let mut cond = Condition::all();
            for &id in ids {
                cond = cond.add(platform_id_exists(id));
            }
            cond
        }
        Predicate::PlatformNameAny(names) => platform_name_exists(names),
        Predicate::YearExact(year) => {
            Condition::all().add(contents::Column::ReleaseYear.eq(*year))
        }
        Predicate::YearRange { min, max_exclusive } => Condition::all()
            .add(contents::Column::ReleaseYear.gte(*min))
            .add(contents::Column::ReleaseYear.lt(*max_exclusive)),
        // NULL ratings never satisfy >= by SQL comparison semantics, so
        // unrated titles drop out of rating-filtered results.
        Predicate::MinAverageRating(min) => {
            Condition::all().add(contents::Column::AverageRating.gte(*min))
        }
        Predicate::MinCriticsRating(min) => {
            Condition::all().add(contents::Column::CriticsRating.gte(*min))
        }
        Predicate::MinUsersRating(min) => {
            Condition::all().add(contents::Column::UsersRating.gte(*min))
        }
        Predicate::Search(term) => Condition::any()
            .add(lower_like(contents::Column::Title, term))
            .add(lower_like(contents::Column::Description, term))
            .add(m2m_subgenre_exists(subgenre_name_or_slug_matches(term)))
            .add(primary_subgenre_exists(subgenre_name_or_slug_matches(term))),
        Predicate::Subgenre(token) => Condition::any()
            .add(m2m_subgenre_exists(subgenre_token_matches(token)))
            .add(primary_subgenre_exists(subgenre_token_matches(token))),
        Predicate::ContentType(kind) => {
            Condition::all().add(contents::Column::ContentType.eq(kind.as_str()))
        }
    }
}

/// Apply the single deterministic ordering from the `OrderSpec`: NULLs
/// last regardless of direction, then the fixed tie-breaks that keep
/// pagination stable.
fn apply_order(select: Select<Contents>, order: OrderSpec) -> Select<Contents> {
    let dir = match order.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    match order.field {
        SortField::AverageRating => select
            .order_by_with_nulls(contents::Column::AverageRating, dir, NullOrdering::Last)
            .order_by_asc(contents::Column::Title),
        SortField::CriticsRating => select
            .order_by_with_nulls(contents::Column::CriticsRating, dir, NullOrdering::Last)
            .order_by_asc(contents::Column::Title),
        SortField::UsersRating => select
            .order_by_with_nulls(contents::Column::UsersRating, dir, NullOrdering::Last)
            .order_by_asc(contents::Column::Title),
        SortField::ReleaseDate => select
            .order_by_with_nulls(contents::Column::ReleaseYear, dir, NullOrdering::Last)
            .order_by_asc(contents::Column::Title),
    }
}
