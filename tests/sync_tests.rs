use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use dreadarr::clients::tvdb::{ArtworkRecord, ArtworkSearchHit};
use dreadarr::clients::watchmode::{
    CatalogGenre, CatalogSource, SearchPage, TitleCandidate, TitleDetails, TitleSource,
};
use dreadarr::clients::{ArtworkClient, CatalogClient};
use dreadarr::config::Config;
use dreadarr::models::content::NewContent;
use dreadarr::query::{ContentFilter, build_filter_spec};
use dreadarr::services::{SyncError, SyncParams, SyncStrategy};
use dreadarr::state::SharedState;

/// Catalog fixture: one page of candidates with canned details and
/// sources, so the whole pipeline runs without network access.
#[derive(Default)]
struct FixtureCatalog {
    titles: Vec<TitleCandidate>,
    details: HashMap<i64, TitleDetails>,
    sources: HashMap<i64, Vec<TitleSource>>,
    sources_down: bool,
    catalog_genres: Vec<CatalogGenre>,
    catalog_sources: Vec<CatalogSource>,
}

impl FixtureCatalog {
    fn page(&self, page: u32) -> SearchPage {
        let titles = if page == 1 {
            self.titles.clone()
        } else {
            Vec::new()
        };
        SearchPage {
            titles,
            page: Some(page),
            total_pages: Some(1),
            total_results: Some(self.titles.len() as u32),
        }
    }
}

#[async_trait]
impl CatalogClient for FixtureCatalog {
    async fn search_titles(
        &self,
        _genre_id: i32,
        page: u32,
        _page_size: u32,
    ) -> Result<SearchPage> {
        Ok(self.page(page))
    }

    async fn recent_releases(
        &self,
        _days_back: u32,
        page: u32,
        _page_size: u32,
    ) -> Result<SearchPage> {
        Ok(self.page(page))
    }

    async fn get_title_details(&self, title_id: i64) -> Result<TitleDetails> {
        self.details
            .get(&title_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no details fixture for {title_id}"))
    }

    async fn get_title_sources(&self, title_id: i64) -> Result<Vec<TitleSource>> {
        if self.sources_down {
            anyhow::bail!("sources endpoint down");
        }
        Ok(self.sources.get(&title_id).cloned().unwrap_or_default())
    }

    async fn list_genres(&self) -> Result<Vec<CatalogGenre>> {
        Ok(self.catalog_genres.clone())
    }

    async fn list_sources(&self) -> Result<Vec<CatalogSource>> {
        Ok(self.catalog_sources.clone())
    }
}

/// Artwork fixture that never has anything, forcing the catalog-poster
/// and placeholder fallbacks.
struct NoArtwork;

#[async_trait]
impl ArtworkClient for NoArtwork {
    async fn movie_by_remote_id(&self, _imdb_id: &str) -> Result<Option<ArtworkRecord>> {
        Ok(None)
    }

    async fn series_by_remote_id(&self, _imdb_id: &str) -> Result<Option<ArtworkRecord>> {
        Ok(None)
    }

    async fn search(&self, _query: &str, _kind: Option<&str>) -> Result<Vec<ArtworkSearchHit>> {
        Ok(Vec::new())
    }

    fn poster_url(&self, filename: &str) -> String {
        filename.to_string()
    }
}

fn candidate(id: i64, title: &str, year: i32) -> TitleCandidate {
    TitleCandidate {
        id,
        title: title.to_string(),
        year: Some(year),
        imdb_id: None,
        tmdb_id: None,
        title_type: Some("movie".to_string()),
    }
}

fn details(id: i64, title: &str, year: i32, genres: Vec<i32>) -> TitleDetails {
    TitleDetails {
        id,
        title: title.to_string(),
        year: Some(year),
        imdb_id: None,
        tmdb_id: None,
        title_type: Some("movie".to_string()),
        plot_overview: Some("A terrible thing happens.".to_string()),
        poster: Some(format!("https://cdn.example/{id}_w185.jpg")),
        user_rating: Some(7.0),
        critic_score: Some(70.0),
        genres,
        genre_names: vec!["Horror".to_string()],
    }
}

fn streaming_source(source_id: i32, name: &str) -> TitleSource {
    TitleSource {
        source_id,
        name: name.to_string(),
        source_type: Some("sub".to_string()),
        region: Some("US".to_string()),
        web_url: Some(format!("https://{}.example/watch", name.to_lowercase())),
        seasons: None,
        episodes: None,
    }
}

async fn fixture_state(catalog: FixtureCatalog, limit: i32) -> SharedState {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.watchmode.monthly_request_limit = limit;

    SharedState::with_clients(config, Arc::new(catalog), Arc::new(NoArtwork))
        .await
        .expect("Failed to build fixture state")
}

/// Default API key seeded by migration (must match m20240101_initial.rs)
const DEFAULT_API_KEY: &str = "dreadarr_default_api_key_please_regenerate";

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn seeded(id: i64, title: &str, year: i32) -> NewContent {
    NewContent {
        title: title.to_string(),
        release_year: Some(year),
        content_type: "movie".to_string(),
        watchmode_id: Some(id),
        ..NewContent::default()
    }
}

#[tokio::test]
async fn genre_sync_end_to_end() {
    let mut catalog = FixtureCatalog::default();
    for (id, title, year) in [
        (1, "The Thing", 1982),
        (2, "Candyman", 1992),
        (3, "Hereditary", 2018),
        (4, "Alien", 1979),
        (5, "The Fog", 1980),
    ] {
        catalog.titles.push(candidate(id, title, year));
        catalog.details.insert(id, details(id, title, year, vec![11]));
        catalog
            .sources
            .insert(id, vec![streaming_source(203, "Shudder")]);
    }

    let state = fixture_state(catalog, 1000).await;

    // Two of the five are already in the catalog.
    state.store.create_content(&seeded(4, "Alien", 1979)).await.unwrap();
    state
        .store
        .create_content(&seeded(5, "The Fog", 1980))
        .await
        .unwrap();

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 3);
    assert_eq!(report.duplicates_skipped, 2);
    assert_eq!(report.titles_seen, 5);
    assert_eq!(report.pages_searched, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.titles_processed.len(), 5);

    // One page fetch plus two requests for each of the three new titles.
    let status = state.ledger.status().await.unwrap();
    assert_eq!(status.used, 7);

    let spec = build_filter_spec(&ContentFilter::default());
    let records = state.store.list_content(&spec).await.unwrap();
    assert_eq!(records.len(), 5);

    let thing = records.iter().find(|r| r.title == "The Thing").unwrap();
    assert_eq!(thing.watchmode_id, Some(1));
    assert!((thing.average_rating.unwrap() - 7.0).abs() < 1e-9);
    assert_eq!(
        thing.poster_url.as_deref(),
        Some("https://cdn.example/1_w342.jpg")
    );
    assert_eq!(thing.platforms.len(), 1);
    assert_eq!(thing.platforms[0].name, "Shudder");
}

#[tokio::test]
async fn second_run_adds_nothing() {
    let mut catalog = FixtureCatalog::default();
    for (id, title, year) in [(1, "Ringu", 1998), (2, "Audition", 1999)] {
        catalog.titles.push(candidate(id, title, year));
        catalog.details.insert(id, details(id, title, year, vec![11]));
    }

    let state = fixture_state(catalog, 1000).await;

    let first = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();
    assert_eq!(first.new_items_added, 2);

    let second = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();
    assert_eq!(second.new_items_added, 0);
    assert_eq!(second.duplicates_skipped, 2);

    // Dedup is free: the second run only paid for its page fetch.
    let status = state.ledger.status().await.unwrap();
    assert_eq!(status.used, (1 + 2 * 2) + 1);
}

#[tokio::test]
async fn title_year_dedup_catches_renumbered_ids() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(99, "The Fog", 1980));
    catalog
        .details
        .insert(99, details(99, "The Fog", 1980, vec![11]));

    let state = fixture_state(catalog, 1000).await;
    state
        .store
        .create_content(&seeded(5, "the fog", 1980))
        .await
        .unwrap();

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 0);
    assert_eq!(report.duplicates_skipped, 1);
}

#[tokio::test]
async fn refuses_when_quota_exhausted() {
    let state = fixture_state(FixtureCatalog::default(), 1000).await;
    state.ledger.set_used(1000).await.unwrap();

    let result = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await;

    assert!(matches!(result, Err(SyncError::Quota(_))));
}

#[tokio::test]
async fn refuses_when_remaining_covers_no_title() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "It Follows", 2014));
    catalog
        .details
        .insert(1, details(1, "It Follows", 2014, vec![11]));

    let state = fixture_state(catalog, 1000).await;
    state.ledger.set_used(999).await.unwrap();

    // One unit left buys no enrichment, so not even the page search runs.
    let result = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await;

    assert!(matches!(result, Err(SyncError::Quota(_))));
    let status = state.ledger.status().await.unwrap();
    assert_eq!(status.used, 999);
}

#[tokio::test]
async fn stops_when_budget_runs_out() {
    let mut catalog = FixtureCatalog::default();
    for (id, title, year) in [
        (1, "Scream", 1996),
        (2, "Scream 2", 1997),
        (3, "Scream 3", 2000),
    ] {
        catalog.titles.push(candidate(id, title, year));
        catalog.details.insert(id, details(id, title, year, vec![11]));
    }

    // Room for the page fetch plus exactly one enrichment.
    let state = fixture_state(catalog, 3).await;

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 1);

    let status = state.ledger.status().await.unwrap();
    assert_eq!(status.used, 3);
    assert_eq!(status.remaining, 0);
}

#[tokio::test]
async fn max_requests_param_derates_the_run() {
    let mut catalog = FixtureCatalog::default();
    for (id, title, year) in [(1, "Saw", 2004), (2, "Saw II", 2005)] {
        catalog.titles.push(candidate(id, title, year));
        catalog.details.insert(id, details(id, title, year, vec![11]));
    }

    let state = fixture_state(catalog, 1000).await;

    let params = SyncParams {
        max_requests: Some(3),
        ..SyncParams::default()
    };
    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &params)
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 1);
}

#[tokio::test]
async fn filters_titles_outside_the_genre() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "Paddington", 2014));
    // Details come back without the catalog genre tag.
    catalog
        .details
        .insert(1, details(1, "Paddington", 2014, vec![4]));

    let state = fixture_state(catalog, 1000).await;

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 0);
    assert_eq!(report.filtered_out, 1);

    let spec = build_filter_spec(&ContentFilter::default());
    assert!(state.store.list_content(&spec).await.unwrap().is_empty());

    // Rejected after the details call alone, so the unused sources unit
    // went back to the ledger: 1 page fetch + 1 details.
    let status = state.ledger.status().await.unwrap();
    assert_eq!(status.used, 2);
}

#[tokio::test]
async fn marker_genre_lands_hidden() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "Borderline Case", 2020));
    catalog
        .details
        .insert(1, details(1, "Borderline Case", 2020, vec![11, 33]));

    let state = fixture_state(catalog, 1000).await;

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();
    assert_eq!(report.new_items_added, 1);

    // Hidden rows never surface in the default browse view.
    let spec = build_filter_spec(&ContentFilter::default());
    assert!(state.store.list_content(&spec).await.unwrap().is_empty());

    let spec = build_filter_spec(&ContentFilter {
        include_hidden: true,
        ..ContentFilter::default()
    });
    let records = state.store.list_content(&spec).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].hidden);
}

#[tokio::test]
async fn min_rating_and_platform_filters_apply() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "Mediocre Scares", 2021));
    catalog
        .details
        .insert(1, details(1, "Mediocre Scares", 2021, vec![11]));
    catalog
        .sources
        .insert(1, vec![streaming_source(203, "Shudder")]);

    let state = fixture_state(catalog, 1000).await;

    let params = SyncParams {
        min_rating: Some(9.0),
        ..SyncParams::default()
    };
    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &params)
        .await
        .unwrap();
    assert_eq!(report.filtered_out, 1);
    assert_eq!(state.ledger.status().await.unwrap().used, 2);

    let params = SyncParams {
        selected_platforms: Some(vec!["Netflix".to_string()]),
        ..SyncParams::default()
    };
    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &params)
        .await
        .unwrap();
    assert_eq!(report.filtered_out, 1);
    assert_eq!(report.new_items_added, 0);

    // The platform check needs the sources call, so this run spent all
    // three units it reserved.
    assert_eq!(state.ledger.status().await.unwrap().used, 5);
}

#[tokio::test]
async fn sources_outage_keeps_the_title() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "The Thing", 1982));
    catalog
        .details
        .insert(1, details(1, "The Thing", 1982, vec![11]));
    catalog.sources_down = true;

    let state = fixture_state(catalog, 1000).await;

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();

    // A dead sources endpoint must not cost us the title.
    assert_eq!(report.new_items_added, 1);
    assert_eq!(report.errors, 0);

    let spec = build_filter_spec(&ContentFilter::default());
    let records = state.store.list_content(&spec).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "The Thing");
    assert!(records[0].platforms.is_empty());

    // The failed sources request was still issued and still counts.
    assert_eq!(state.ledger.status().await.unwrap().used, 3);
}

#[tokio::test]
async fn poster_falls_back_to_placeholder() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "Lost Media", 1971));
    let mut d = details(1, "Lost Media", 1971, vec![11]);
    d.poster = None;
    catalog.details.insert(1, d);

    let state = fixture_state(catalog, 1000).await;

    let report = state
        .sync_service
        .run(SyncStrategy::GenreCatalog, &SyncParams::default())
        .await
        .unwrap();
    assert_eq!(report.new_items_added, 1);

    let spec = build_filter_spec(&ContentFilter::default());
    let records = state.store.list_content(&spec).await.unwrap();
    assert_eq!(
        records[0].poster_url.as_deref(),
        Some("/images/default-poster.svg")
    );
}

#[tokio::test]
async fn recent_releases_strategy_uses_same_pipeline() {
    let mut catalog = FixtureCatalog::default();
    catalog.titles.push(candidate(1, "Fresh Terror", 2026));
    catalog
        .details
        .insert(1, details(1, "Fresh Terror", 2026, vec![11]));

    let state = fixture_state(catalog, 1000).await;

    let report = state
        .sync_service
        .run(
            SyncStrategy::RecentReleases { days_back: 7 },
            &SyncParams::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.new_items_added, 1);
    assert_eq!(report.pages_searched, 1);
}

#[tokio::test]
async fn catalog_metadata_routes_hit_the_provider() {
    let mut catalog = FixtureCatalog::default();
    catalog.catalog_genres.push(CatalogGenre {
        id: 11,
        name: "Horror".to_string(),
    });
    catalog.catalog_sources.push(CatalogSource {
        id: 203,
        name: "Shudder".to_string(),
        source_type: Some("sub".to_string()),
        logo_100px: None,
    });

    let state = fixture_state(catalog, 1000).await;
    let app_state = dreadarr::api::create_app_state(Arc::new(state), None);
    let app = dreadarr::api::router(app_state).await;

    let response = app
        .clone()
        .oneshot(authed_get("/api/admin/watchmode/genres"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], 11);
    assert_eq!(json["data"][0]["name"], "Horror");

    let response = app
        .oneshot(authed_get("/api/admin/watchmode/sources"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], 203);
    assert_eq!(json["data"][0]["name"], "Shudder");
}
