pub use super::api_usage::Entity as ApiUsage;
pub use super::content_platforms::Entity as ContentPlatforms;
pub use super::content_subgenres::Entity as ContentSubgenres;
pub use super::contents::Entity as Contents;
pub use super::feedback::Entity as Feedback;
pub use super::issues::Entity as Issues;
pub use super::platforms::Entity as Platforms;
pub use super::subgenres::Entity as Subgenres;
pub use super::users::Entity as Users;
pub use super::watchlist::Entity as Watchlist;
