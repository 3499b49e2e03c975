use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::ArtworkClient;

const TVDB_API: &str = "https://api4.thetvdb.com/v4";
const ARTWORK_BASE: &str = "https://artworks.thetvdb.com";

/// TVDB bearer tokens are valid for a month; refresh a little early.
const TOKEN_TTL: Duration = Duration::from_secs(29 * 24 * 60 * 60);

#[derive(Debug, Clone, Deserialize)]
pub struct ArtworkRecord {
    pub name: Option<String>,
    pub year: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtworkSearchHit {
    pub name: Option<String>,
    pub year: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvdbResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RemoteIdResult {
    movie: Option<ArtworkRecord>,
    series: Option<ArtworkRecord>,
}

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

pub struct TvdbClient {
    client: Client,
    api_key: String,
    token: RwLock<Option<CachedToken>>,
}

impl TvdbClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            token: RwLock::new(None),
        }
    }

    /// Returns a valid bearer token, logging in if the cached one is
    /// missing or older than [`TOKEN_TTL`].
    async fn bearer_token(&self) -> Result<String> {
        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < TOKEN_TTL {
                    return Ok(cached.token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < TOKEN_TTL {
                return Ok(cached.token.clone());
            }
        }

        debug!("Logging in to TVDB for a fresh bearer token");
        let response = self
            .client
            .post(format!("{TVDB_API}/login"))
            .json(&serde_json::json!({ "apikey": self.api_key }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TVDB login error: {} - {}", status, body));
        }

        let login: TvdbResponse<LoginData> = response.json().await?;
        let token = login.data.token;
        *guard = Some(CachedToken {
            token: token.clone(),
            fetched_at: Instant::now(),
        });

        Ok(token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let token = self.bearer_token().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TVDB API error: {} - {}", status, body));
        }

        let body: TvdbResponse<T> = response.json().await?;
        Ok(Some(body.data))
    }

    async fn by_remote_id(&self, imdb_id: &str) -> Result<Vec<RemoteIdResult>> {
        let url = format!(
            "{}/search/remoteid/{}",
            TVDB_API,
            urlencoding::encode(imdb_id)
        );
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }
}

#[async_trait]
impl ArtworkClient for TvdbClient {
    async fn movie_by_remote_id(&self, imdb_id: &str) -> Result<Option<ArtworkRecord>> {
        let results = self.by_remote_id(imdb_id).await?;
        Ok(results.into_iter().find_map(|r| r.movie))
    }

    async fn series_by_remote_id(&self, imdb_id: &str) -> Result<Option<ArtworkRecord>> {
        let results = self.by_remote_id(imdb_id).await?;
        Ok(results.into_iter().find_map(|r| r.series))
    }

    async fn search(&self, query: &str, kind: Option<&str>) -> Result<Vec<ArtworkSearchHit>> {
        let mut url = format!("{}/search?query={}", TVDB_API, urlencoding::encode(query));
        if let Some(kind) = kind {
            url.push_str("&type=");
            url.push_str(kind);
        }
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }

    fn poster_url(&self, filename: &str) -> String {
        if filename.starts_with("http://") || filename.starts_with("https://") {
            return filename.to_string();
        }
        if filename.starts_with('/') {
            return format!("{ARTWORK_BASE}{filename}");
        }
        format!("{ARTWORK_BASE}/{filename}")
    }
}
