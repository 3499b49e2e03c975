pub mod content;
pub mod feedback;
pub mod platform;
pub mod subgenre;
pub mod usage;
pub mod user;
pub mod watchlist;
