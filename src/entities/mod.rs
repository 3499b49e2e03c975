pub mod prelude;

pub mod api_usage;
pub mod content_platforms;
pub mod content_subgenres;
pub mod contents;
pub mod feedback;
pub mod issues;
pub mod platforms;
pub mod subgenres;
pub mod users;
pub mod watchlist;
