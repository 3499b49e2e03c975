//! Pure filter/sort compiler for the content browse surface.
//!
//! Translates the flat bag of query parameters into a `FilterSpec`: a
//! conjunction of abstract predicates plus exactly one deterministic
//! ordering. A `FilterSpec` is driver-agnostic; the content repository
//! translates it into sea-orm conditions with EXISTS subqueries.
//!
//! Malformed values never error here. A value that doesn't parse is treated
//! as "no filter", so a bad query string degrades to a broader result set
//! instead of a 400.

/// Raw, untyped filter parameters as they arrive from the query string.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub platform_ids: Option<Vec<i32>>,
    pub platform_match: PlatformMatch,
    pub platform_names: Option<Vec<String>>,
    /// Exact year ("1987") or decade token ("1980s").
    pub year: Option<String>,
    pub min_rating: Option<f64>,
    pub min_critics_rating: Option<f64>,
    pub min_users_rating: Option<f64>,
    pub search: Option<String>,
    pub subgenre: Option<String>,
    /// "movie" | "series" | "all"
    pub content_type: Option<String>,
    /// "<field>:<direction>"
    pub sort_by: Option<String>,
    pub include_hidden: bool,
    pub include_inactive: bool,
}

/// How a multi-platform id filter combines: any platform matches, or all
/// must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformMatch {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "movie" => Some(Self::Movie),
            "series" => Some(Self::Series),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// hidden = false OR hidden IS NULL
    NotHidden,
    /// active = true
    ActiveOnly,
    /// OR of EXISTS over the platform join table.
    PlatformIdAny(Vec<i32>),
    /// AND of EXISTS; title must be on every listed platform.
    PlatformIdAll(Vec<i32>),
    /// Case-sensitive key-or-name match through the join table.
    PlatformNameAny(Vec<String>),
    YearExact(i32),
    /// Half-open [min, max_exclusive).
    YearRange { min: i32, max_exclusive: i32 },
    MinAverageRating(f64),
    MinCriticsRating(f64),
    MinUsersRating(f64),
    /// Case-insensitive substring over title, description, and associated
    /// or primary subgenre name/slug.
    Search(String),
    /// Slug exact or name substring, primary or many-to-many.
    Subgenre(String),
    ContentType(ContentKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    AverageRating,
    CriticsRating,
    UsersRating,
    ReleaseDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One primary sort key. The repository appends the deterministic
/// tie-breaks (title, and year before title for release-date sorts) and
/// pushes NULLs last regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self {
            field: SortField::AverageRating,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub predicates: Vec<Predicate>,
    pub order: OrderSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecadeRange {
    pub min: i32,
    pub max_exclusive: i32,
}

/// Translate a decade token like "1990s" into the half-open range
/// [1990, 2000). Returns `None` for anything that isn't a four-digit
/// decade followed by a lowercase or uppercase "s".
#[must_use]
pub fn decade_to_range(token: &str) -> Option<DecadeRange> {
    let digits = token.strip_suffix('s').or_else(|| token.strip_suffix('S'))?;
    if digits.len() != 4 {
        return None;
    }
    let min: i32 = digits.parse().ok()?;
    if min % 10 != 0 {
        return None;
    }
    Some(DecadeRange {
        min,
        max_exclusive: min + 10,
    })
}

/// Parse a "<field>:<direction>" sort token. Any other shape, including
/// legacy bare tokens like "rating", falls back to average_rating:desc.
#[must_use]
pub fn parse_sort(token: Option<&str>) -> OrderSpec {
    let Some(token) = token else {
        return OrderSpec::default();
    };
    let Some((field, direction)) = token.split_once(':') else {
        return OrderSpec::default();
    };
    let field = match field {
        "average_rating" => SortField::AverageRating,
        "critics_rating" => SortField::CriticsRating,
        "users_rating" => SortField::UsersRating,
        "release_date" => SortField::ReleaseDate,
        _ => return OrderSpec::default(),
    };
    let direction = match direction {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        _ => return OrderSpec::default(),
    };
    OrderSpec { field, direction }
}

/// Compile the raw parameter bag into a predicate conjunction plus one
/// deterministic ordering.
#[must_use]
pub fn build_filter_spec(filter: &ContentFilter) -> FilterSpec {
    let mut predicates = Vec::new();

    if !filter.include_hidden {
        predicates.push(Predicate::NotHidden);
    }
    if !filter.include_inactive {
        predicates.push(Predicate::ActiveOnly);
    }

    if let Some(ids) = &filter.platform_ids
        && !ids.is_empty()
    {
        predicates.push(match filter.platform_match {
            PlatformMatch::Any => Predicate::PlatformIdAny(ids.clone()),
            PlatformMatch::All => Predicate::PlatformIdAll(ids.clone()),
        });
    }

    if let Some(names) = &filter.platform_names {
        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if !names.is_empty() {
            predicates.push(Predicate::PlatformNameAny(names));
        }
    }

    if let Some(token) = filter.year.as_deref().map(str::trim) {
        if let Ok(year) = token.parse::<i32>() {
            predicates.push(Predicate::YearExact(year));
        } else if let Some(range) = decade_to_range(token) {
            predicates.push(Predicate::YearRange {
                min: range.min,
                max_exclusive: range.max_exclusive,
            });
        }
        // Unrecognized tokens drop the year filter entirely.
    }

    if let Some(min) = filter.min_rating {
        predicates.push(Predicate::MinAverageRating(min));
    }
    if let Some(min) = filter.min_critics_rating {
        predicates.push(Predicate::MinCriticsRating(min));
    }
    if let Some(min) = filter.min_users_rating {
        predicates.push(Predicate::MinUsersRating(min));
    }

    if let Some(term) = filter.search.as_deref().map(str::trim)
        && !term.is_empty()
    {
        predicates.push(Predicate::Search(term.to_string()));
    }

    if let Some(token) = filter.subgenre.as_deref().map(str::trim)
        && !token.is_empty()
    {
        predicates.push(Predicate::Subgenre(token.to_string()));
    }

    if let Some(kind) = filter
        .content_type
        .as_deref()
        .map(str::trim)
        .and_then(ContentKind::parse)
    {
        predicates.push(Predicate::ContentType(kind));
    }

    FilterSpec {
        predicates,
        order: parse_sort(filter.sort_by.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_token_maps_to_half_open_range() {
        assert_eq!(
            decade_to_range("1990s"),
            Some(DecadeRange {
                min: 1990,
                max_exclusive: 2000
            })
        );
        assert_eq!(
            decade_to_range("2020s"),
            Some(DecadeRange {
                min: 2020,
                max_exclusive: 2030
            })
        );
    }

    #[test]
    fn bad_decade_tokens_are_rejected() {
        assert_eq!(decade_to_range("1990"), None);
        assert_eq!(decade_to_range("199s"), None);
        assert_eq!(decade_to_range("1995s"), None);
        assert_eq!(decade_to_range("nineties"), None);
        assert_eq!(decade_to_range(""), None);
    }

    #[test]
    fn unrecognized_year_token_applies_no_filter() {
        let filter = ContentFilter {
            year: Some("nineties".to_string()),
            include_hidden: true,
            include_inactive: true,
            ..Default::default()
        };
        let spec = build_filter_spec(&filter);
        assert!(spec.predicates.is_empty());
    }

    #[test]
    fn exact_year_beats_decade_parse() {
        let filter = ContentFilter {
            year: Some("1987".to_string()),
            ..Default::default()
        };
        let spec = build_filter_spec(&filter);
        assert!(spec.predicates.contains(&Predicate::YearExact(1987)));
    }

    #[test]
    fn visibility_predicates_default_on() {
        let spec = build_filter_spec(&ContentFilter::default());
        assert!(spec.predicates.contains(&Predicate::NotHidden));
        assert!(spec.predicates.contains(&Predicate::ActiveOnly));
    }

    #[test]
    fn admin_flags_drop_visibility_predicates() {
        let filter = ContentFilter {
            include_hidden: true,
            include_inactive: true,
            ..Default::default()
        };
        let spec = build_filter_spec(&filter);
        assert!(!spec.predicates.contains(&Predicate::NotHidden));
        assert!(!spec.predicates.contains(&Predicate::ActiveOnly));
    }

    #[test]
    fn sort_tokens_parse_and_fall_back() {
        let ok = parse_sort(Some("critics_rating:asc"));
        assert_eq!(ok.field, SortField::CriticsRating);
        assert_eq!(ok.direction, SortDirection::Asc);

        for bad in [
            Some("rating"),
            Some("critics_rating"),
            Some("critics_rating:sideways"),
            Some("imdb_rating:asc"),
            Some(""),
            None,
        ] {
            let spec = parse_sort(bad);
            assert_eq!(spec.field, SortField::AverageRating);
            assert_eq!(spec.direction, SortDirection::Desc);
        }
    }

    #[test]
    fn blank_search_and_subgenre_are_dropped() {
        let filter = ContentFilter {
            search: Some("   ".to_string()),
            subgenre: Some(String::new()),
            include_hidden: true,
            include_inactive: true,
            ..Default::default()
        };
        assert!(build_filter_spec(&filter).predicates.is_empty());
    }

    #[test]
    fn content_type_all_is_no_filter() {
        let filter = ContentFilter {
            content_type: Some("all".to_string()),
            include_hidden: true,
            include_inactive: true,
            ..Default::default()
        };
        assert!(build_filter_spec(&filter).predicates.is_empty());

        let filter = ContentFilter {
            content_type: Some("series".to_string()),
            include_hidden: true,
            include_inactive: true,
            ..Default::default()
        };
        assert_eq!(
            build_filter_spec(&filter).predicates,
            vec![Predicate::ContentType(ContentKind::Series)]
        );
    }

    #[test]
    fn platform_match_mode_selects_predicate() {
        let filter = ContentFilter {
            platform_ids: Some(vec![1, 2]),
            platform_match: PlatformMatch::All,
            ..Default::default()
        };
        let spec = build_filter_spec(&filter);
        assert!(spec
            .predicates
            .contains(&Predicate::PlatformIdAll(vec![1, 2])));

        let filter = ContentFilter {
            platform_ids: Some(vec![]),
            ..Default::default()
        };
        let spec = build_filter_spec(&filter);
        assert!(!spec
            .predicates
            .iter()
            .any(|p| matches!(p, Predicate::PlatformIdAny(_) | Predicate::PlatformIdAll(_))));
    }
}
