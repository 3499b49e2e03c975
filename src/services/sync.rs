//! Catalog ingestion pipeline.
//!
//! One orchestrator drives both ingestion flavors (bulk genre sync and the
//! new-to-streaming sweep); they differ only in how pages of candidates are
//! fetched. Dedup runs before any enrichment spend, the quota governor
//! gates every external request, and one bad title never aborts the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::CatalogClient;
use crate::clients::watchmode::{TitleCandidate, TitleDetails, TitleSource};
use crate::config::SyncConfig;
use crate::db::Store;
use crate::models::content::NewContent;
use crate::query::ContentKind;
use crate::services::poster::PosterResolver;
use crate::services::usage::{QuotaError, UsageLedger};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Which candidate stream a sync run pages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Bulk sync of the configured genre's full catalog listing.
    GenreCatalog,
    /// Titles that newly arrived on streaming sources recently.
    RecentReleases { days_back: u32 },
}

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncParams {
    /// Cap on external requests this run may spend, on top of the
    /// monthly ceiling.
    pub max_requests: Option<i32>,
    /// When set and non-empty, only keep titles available on at least
    /// one of these platforms (case-insensitive name match).
    pub selected_platforms: Option<Vec<String>>,
    pub min_rating: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleAction {
    Added,
    SkippedExisting,
    FilteredOut,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleOutcome {
    pub title: String,
    pub year: Option<i32>,
    pub action: TitleAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub new_items_added: u32,
    pub items_validated: u32,
    pub items_removed: u32,
    pub duplicates_skipped: u32,
    pub filtered_out: u32,
    pub pages_searched: u32,
    pub titles_seen: u32,
    pub errors: u32,
    pub titles_processed: Vec<TitleOutcome>,
}

impl SyncReport {
    fn record(&mut self, title: &TitleCandidate, action: TitleAction, reason: Option<String>) {
        match action {
            TitleAction::Added => self.new_items_added += 1,
            TitleAction::SkippedExisting => self.duplicates_skipped += 1,
            TitleAction::FilteredOut => self.filtered_out += 1,
            TitleAction::Error => self.errors += 1,
        }
        self.titles_processed.push(TitleOutcome {
            title: title.title.clone(),
            year: title.year,
            action,
            reason,
        });
    }
}

pub struct SyncService {
    store: Store,
    catalog: Arc<dyn CatalogClient>,
    posters: PosterResolver,
    ledger: UsageLedger,
    sync_config: SyncConfig,
    requests_per_title: i32,
}

impl SyncService {
    pub fn new(
        store: Store,
        catalog: Arc<dyn CatalogClient>,
        posters: PosterResolver,
        ledger: UsageLedger,
        sync_config: SyncConfig,
        requests_per_title: i32,
    ) -> Self {
        Self {
            store,
            catalog,
            posters,
            ledger,
            sync_config,
            requests_per_title,
        }
    }

    /// Run one sync pass. Refuses to start when the monthly budget is
    /// already spent; otherwise stops cleanly whenever the remaining
    /// budget cannot cover the next request.
    pub async fn run(
        &self,
        strategy: SyncStrategy,
        params: &SyncParams,
    ) -> Result<SyncReport, SyncError> {
        let status = self.ledger.status().await?;
        // A run that cannot afford even one enrichment would spend its
        // whole budget on page searches; refuse before the first one.
        if status.remaining <= 0 || status.remaining / self.requests_per_title == 0 {
            return Err(SyncError::Quota(QuotaError::Exhausted {
                month: status.month,
                used: status.used,
                limit: status.limit,
            }));
        }

        // Derate the run to whatever budget is actually left.
        let mut budget = params
            .max_requests
            .map_or(status.remaining, |m| m.min(status.remaining));

        info!(
            ?strategy,
            budget,
            used = status.used,
            limit = status.limit,
            "Starting catalog sync"
        );

        let mut report = SyncReport::default();

        'pages: for page in 1..=self.sync_config.max_pages {
            if budget < 1 {
                break;
            }
            if let Err(QuotaError::Exhausted { .. }) = self.ledger.reserve(1).await {
                break;
            }
            budget -= 1;

            let page_result = match strategy {
                SyncStrategy::GenreCatalog => {
                    self.catalog
                        .search_titles(
                            self.sync_config.horror_genre_id,
                            page,
                            self.sync_config.page_size,
                        )
                        .await
                }
                SyncStrategy::RecentReleases { days_back } => {
                    self.catalog
                        .recent_releases(days_back, page, self.sync_config.page_size)
                        .await
                }
            };

            let search_page = match page_result {
                Ok(p) => p,
                Err(e) => {
                    warn!(page, "Catalog page fetch failed: {e}");
                    report.errors += 1;
                    break;
                }
            };

            report.pages_searched += 1;
            if search_page.titles.is_empty() {
                break;
            }

            for candidate in &search_page.titles {
                report.titles_seen += 1;

                match self.dedup_reason(candidate).await? {
                    Some(reason) => {
                        report.record(candidate, TitleAction::SkippedExisting, Some(reason));
                        continue;
                    }
                    None => {}
                }

                // Enrichment spends real budget; dedup above did not.
                if budget < self.requests_per_title {
                    break 'pages;
                }
                match self.ledger.reserve(self.requests_per_title).await {
                    Ok(()) => budget -= self.requests_per_title,
                    Err(QuotaError::Exhausted { .. }) => break 'pages,
                    Err(e) => return Err(e.into()),
                }

                let mut spent = 0;
                let outcome = self.enrich_and_persist(candidate, params, &mut spent).await;

                // A title rejected before the sources call spent fewer
                // requests than were reserved; give the rest back.
                let unspent = self.requests_per_title - spent;
                if unspent > 0 {
                    self.ledger.release(unspent).await?;
                    budget += unspent;
                }

                match outcome {
                    Ok((action, reason)) => report.record(candidate, action, reason),
                    Err(e) => {
                        warn!(title = %candidate.title, "Title ingestion failed: {e}");
                        report.record(candidate, TitleAction::Error, Some(e.to_string()));
                    }
                }
            }

            if let Some(total_pages) = search_page.total_pages {
                if page >= total_pages {
                    break;
                }
            }
        }

        info!(
            added = report.new_items_added,
            duplicates = report.duplicates_skipped,
            filtered = report.filtered_out,
            errors = report.errors,
            pages = report.pages_searched,
            "Catalog sync finished"
        );

        Ok(report)
    }

    /// Cheap local dedup, run before any budget is spent: exact external
    /// id match first, then case-insensitive title with the year within
    /// one of an existing row.
    async fn dedup_reason(&self, candidate: &TitleCandidate) -> Result<Option<String>, SyncError> {
        if self
            .store
            .find_content_by_watchmode_id(candidate.id)
            .await?
            .is_some()
        {
            return Ok(Some("external id already in catalog".to_string()));
        }

        if let Some(year) = candidate.year {
            if self
                .store
                .find_content_by_title_year(&candidate.title, year)
                .await?
                .is_some()
            {
                return Ok(Some("title and year already in catalog".to_string()));
            }
        }

        Ok(None)
    }

    /// `spent` counts the external requests actually issued, so the caller
    /// can release whatever part of the reservation went unused.
    async fn enrich_and_persist(
        &self,
        candidate: &TitleCandidate,
        params: &SyncParams,
        spent: &mut i32,
    ) -> anyhow::Result<(TitleAction, Option<String>)> {
        *spent += 1;
        let details = self.catalog.get_title_details(candidate.id).await?;

        if !details.genres.contains(&self.sync_config.horror_genre_id) {
            return Ok((
                TitleAction::FilteredOut,
                Some("not tagged with the catalog genre".to_string()),
            ));
        }

        let critics_rating = details.critic_score.map(normalize_rating);
        let users_rating = details.user_rating.map(normalize_rating);
        let average_rating = average_of(critics_rating, users_rating);

        if let Some(min_rating) = params.min_rating {
            if min_rating > 0.0 && average_rating.unwrap_or(0.0) < min_rating {
                return Ok((
                    TitleAction::FilteredOut,
                    Some(format!("rating below minimum {min_rating}")),
                ));
            }
        }

        // Source lookup is best-effort: the title still lands in the
        // catalog with zero platform links if this call fails.
        *spent += 1;
        let sources = match self.catalog.get_title_sources(candidate.id).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(title = %candidate.title, "Source lookup failed: {e}");
                Vec::new()
            }
        };
        let streaming: Vec<&TitleSource> = sources
            .iter()
            .filter(|s| {
                s.source_type
                    .as_deref()
                    .is_none_or(|t| t == "sub" || t == "free")
            })
            .collect();

        if let Some(selected) = params
            .selected_platforms
            .as_deref()
            .filter(|p| !p.is_empty())
        {
            let available = streaming.iter().any(|s| {
                selected
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(&s.name))
            });
            if !available {
                return Ok((
                    TitleAction::FilteredOut,
                    Some("not available on selected platforms".to_string()),
                ));
            }
        }

        let kind = content_kind(&details);
        let poster_url = self
            .posters
            .resolve(
                &details.title,
                details.year,
                details.imdb_id.as_deref(),
                kind,
                details.poster.as_deref(),
            )
            .await;

        // Another run may have persisted this title while we were
        // enriching it.
        if self
            .store
            .find_content_by_watchmode_id(candidate.id)
            .await?
            .is_some()
        {
            return Ok((
                TitleAction::SkippedExisting,
                Some("added concurrently".to_string()),
            ));
        }

        let hidden = details
            .genres
            .contains(&self.sync_config.non_horror_marker_genre_id);

        let new_content = NewContent {
            title: details.title.clone(),
            release_year: details.year,
            critics_rating,
            users_rating,
            average_rating,
            description: details.plot_overview.clone(),
            poster_url: Some(poster_url),
            content_type: kind.as_str().to_string(),
            seasons: None,
            episodes: None,
            watchmode_id: Some(details.id),
            imdb_id: details.imdb_id.clone(),
            tmdb_id: details.tmdb_id,
            hidden,
            watchmode_data: serde_json::to_string(&serde_json::json!({
                "id": details.id,
                "genres": details.genres,
                "genre_names": details.genre_names,
            }))
            .ok(),
        };

        let content = self.store.create_content(&new_content).await?;

        self.link_subgenres(content.id, &details).await?;
        self.link_platforms(content.id, &streaming).await?;

        info!(id = content.id, title = %content.title, hidden, "Added content from catalog");
        Ok((TitleAction::Added, None))
    }

    /// Map the catalog's genre names onto local subgenres by name; the
    /// first match becomes the primary.
    async fn link_subgenres(&self, content_id: i32, details: &TitleDetails) -> anyhow::Result<()> {
        let known = self.store.list_subgenres(true).await?;
        let matched: Vec<i32> = details
            .genre_names
            .iter()
            .filter_map(|name| {
                known
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
                    .map(|s| s.id)
            })
            .collect();

        if matched.is_empty() {
            return Ok(());
        }

        self.store.set_content_subgenres(content_id, &matched).await?;
        self.store
            .set_primary_subgenre(content_id, matched[0])
            .await?;
        Ok(())
    }

    async fn link_platforms(
        &self,
        content_id: i32,
        sources: &[&TitleSource],
    ) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for source in sources {
            if !seen.insert(source.source_id) {
                continue;
            }
            let platform = self
                .store
                .get_or_create_platform(source.source_id, &source.name, None)
                .await?;
            self.store
                .upsert_platform_link(
                    content_id,
                    platform.id,
                    source.web_url.as_deref(),
                    source.seasons,
                    source.episodes,
                )
                .await?;
        }
        Ok(())
    }
}

fn content_kind(details: &TitleDetails) -> ContentKind {
    match details.title_type.as_deref() {
        Some(t) if t.contains("series") => ContentKind::Series,
        _ => ContentKind::Movie,
    }
}

/// Catalog critic scores come back on a 0-100 scale, user ratings on
/// 0-10. Store everything as 0-10.
fn normalize_rating(value: f64) -> f64 {
    if value > 10.0 { value / 10.0 } else { value }
}

fn average_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_normalization() {
        assert!((normalize_rating(73.0) - 7.3).abs() < f64::EPSILON);
        assert!((normalize_rating(7.3) - 7.3).abs() < f64::EPSILON);
    }

    #[test]
    fn average_handles_missing_sides() {
        assert_eq!(average_of(Some(8.0), Some(6.0)), Some(7.0));
        assert_eq!(average_of(Some(8.0), None), Some(8.0));
        assert_eq!(average_of(None, None), None);
    }

    #[test]
    fn kind_maps_tv_series() {
        let mut details = TitleDetails {
            id: 1,
            title: "x".to_string(),
            year: None,
            imdb_id: None,
            tmdb_id: None,
            title_type: Some("tv_series".to_string()),
            plot_overview: None,
            poster: None,
            user_rating: None,
            critic_score: None,
            genres: vec![],
            genre_names: vec![],
        };
        assert_eq!(content_kind(&details), ContentKind::Series);
        details.title_type = Some("movie".to_string());
        assert_eq!(content_kind(&details), ContentKind::Movie);
        details.title_type = None;
        assert_eq!(content_kind(&details), ContentKind::Movie);
    }
}
