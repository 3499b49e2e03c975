//! Poster resolution with a strict fallback chain.
//!
//! Artwork provider first (exact remote-id lookup, then gated fuzzy
//! search), then the catalog's own poster URL, then a static placeholder.
//! The result is never empty.

use std::sync::Arc;

use tracing::debug;

use crate::clients::ArtworkClient;
use crate::query::ContentKind;

/// Preferred width token for catalog poster URLs.
const PREFERRED_POSTER_WIDTH: &str = "w342";

pub struct PosterResolver {
    artwork: Arc<dyn ArtworkClient>,
    default_poster: String,
}

impl PosterResolver {
    pub fn new(artwork: Arc<dyn ArtworkClient>, default_poster: String) -> Self {
        Self {
            artwork,
            default_poster,
        }
    }

    pub async fn resolve(
        &self,
        title: &str,
        year: Option<i32>,
        imdb_id: Option<&str>,
        kind: ContentKind,
        catalog_poster: Option<&str>,
    ) -> String {
        if let Some(url) = self.from_remote_id(imdb_id, kind).await {
            return url;
        }

        if let Some(url) = self.from_search(title, year, kind).await {
            return url;
        }

        if let Some(poster) = catalog_poster.filter(|p| !p.is_empty()) {
            return normalize_poster_resolution(poster);
        }

        self.default_poster.clone()
    }

    async fn from_remote_id(&self, imdb_id: Option<&str>, kind: ContentKind) -> Option<String> {
        let imdb_id = imdb_id.filter(|id| !id.is_empty())?;

        let result = match kind {
            ContentKind::Movie => self.artwork.movie_by_remote_id(imdb_id).await,
            ContentKind::Series => self.artwork.series_by_remote_id(imdb_id).await,
        };

        match result {
            Ok(record) => record
                .and_then(|r| r.image)
                .filter(|image| !image.is_empty())
                .map(|image| self.artwork.poster_url(&image)),
            Err(e) => {
                debug!(imdb_id, "Artwork remote-id lookup failed: {e}");
                None
            }
        }
    }

    /// Fuzzy search fallback, gated hard: the hit's year must be within
    /// one year and its name must case-insensitively equal or contain the
    /// title (or vice versa). Better no poster than the wrong film's.
    async fn from_search(
        &self,
        title: &str,
        year: Option<i32>,
        kind: ContentKind,
    ) -> Option<String> {
        let year = year?;

        let kind_str = match kind {
            ContentKind::Movie => "movie",
            ContentKind::Series => "series",
        };

        let hits = match self.artwork.search(title, Some(kind_str)).await {
            Ok(hits) => hits,
            Err(e) => {
                debug!(title, "Artwork search failed: {e}");
                return None;
            }
        };

        let wanted = title.to_lowercase();
        hits.into_iter()
            .filter(|hit| {
                let Some(hit_year) = hit.year.as_deref().and_then(|y| y.parse::<i32>().ok())
                else {
                    return false;
                };
                if (hit_year - year).abs() > 1 {
                    return false;
                }
                hit.name.as_deref().is_some_and(|name| {
                    let name = name.to_lowercase();
                    name == wanted || name.contains(&wanted) || wanted.contains(&name)
                })
            })
            .find_map(|hit| hit.image_url)
            .filter(|url| !url.is_empty())
            .map(|url| self.artwork.poster_url(&url))
    }
}

/// Rewrite the width token in a catalog poster URL (`..._w185.jpg`) to the
/// preferred resolution. URLs without a recognizable token pass through.
fn normalize_poster_resolution(url: &str) -> String {
    let Some(start) = url.rfind("_w") else {
        return url.to_string();
    };

    let digits_start = start + 2;
    let digits_end = url[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(url.len(), |offset| digits_start + offset);

    if digits_end == digits_start {
        return url.to_string();
    }

    format!(
        "{}_{}{}",
        &url[..start],
        PREFERRED_POSTER_WIDTH,
        &url[digits_end..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tvdb::{ArtworkRecord, ArtworkSearchHit};
    use anyhow::Result;
    use async_trait::async_trait;

    struct StubArtwork {
        movie: Option<ArtworkRecord>,
        hits: Vec<ArtworkSearchHit>,
    }

    #[async_trait]
    impl ArtworkClient for StubArtwork {
        async fn movie_by_remote_id(&self, _imdb_id: &str) -> Result<Option<ArtworkRecord>> {
            Ok(self.movie.clone())
        }

        async fn series_by_remote_id(&self, _imdb_id: &str) -> Result<Option<ArtworkRecord>> {
            Ok(None)
        }

        async fn search(&self, _query: &str, _kind: Option<&str>) -> Result<Vec<ArtworkSearchHit>> {
            Ok(self.hits.clone())
        }

        fn poster_url(&self, filename: &str) -> String {
            format!("https://art.example{filename}")
        }
    }

    fn resolver(stub: StubArtwork) -> PosterResolver {
        PosterResolver::new(Arc::new(stub), "/images/default-poster.svg".to_string())
    }

    #[tokio::test]
    async fn remote_id_hit_wins() {
        let r = resolver(StubArtwork {
            movie: Some(ArtworkRecord {
                name: Some("The Thing".to_string()),
                year: Some("1982".to_string()),
                image: Some("/posters/thing.jpg".to_string()),
            }),
            hits: vec![],
        });

        let url = r
            .resolve("The Thing", Some(1982), Some("tt0084787"), ContentKind::Movie, None)
            .await;
        assert_eq!(url, "https://art.example/posters/thing.jpg");
    }

    #[tokio::test]
    async fn search_hit_requires_year_proximity() {
        let r = resolver(StubArtwork {
            movie: None,
            hits: vec![ArtworkSearchHit {
                name: Some("Halloween".to_string()),
                year: Some("2007".to_string()),
                image_url: Some("/posters/remake.jpg".to_string()),
                kind: Some("movie".to_string()),
            }],
        });

        // 1978 original must not pick up the 2007 remake's art.
        let url = r
            .resolve("Halloween", Some(1978), None, ContentKind::Movie, None)
            .await;
        assert_eq!(url, "/images/default-poster.svg");
    }

    #[tokio::test]
    async fn catalog_poster_used_when_artwork_misses() {
        let r = resolver(StubArtwork {
            movie: None,
            hits: vec![],
        });

        let url = r
            .resolve(
                "Suspiria",
                Some(1977),
                None,
                ContentKind::Movie,
                Some("https://cdn.example/0345_poster_w185.jpg"),
            )
            .await;
        assert_eq!(url, "https://cdn.example/0345_poster_w342.jpg");
    }

    #[tokio::test]
    async fn placeholder_when_everything_misses() {
        let r = resolver(StubArtwork {
            movie: None,
            hits: vec![],
        });

        let url = r
            .resolve("Obscure Title", None, None, ContentKind::Series, None)
            .await;
        assert_eq!(url, "/images/default-poster.svg");
    }

    #[test]
    fn normalize_passes_through_unrecognized_urls() {
        assert_eq!(
            normalize_poster_resolution("https://cdn.example/poster.jpg"),
            "https://cdn.example/poster.jpg"
        );
    }
}
