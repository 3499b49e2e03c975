pub mod poster;
pub use poster::PosterResolver;

pub mod usage;
pub use usage::{QuotaError, UsageLedger, UsageStatus};

pub mod sync;
pub use sync::{SyncError, SyncParams, SyncReport, SyncService, SyncStrategy, TitleAction};
