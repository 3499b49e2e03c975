use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Upsert targets: one link per (content, platform), one watchlist
        // row per (user, content).
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_content_platforms_content_platform")
                    .table(ContentPlatforms::Table)
                    .col(ContentPlatforms::ContentId)
                    .col(ContentPlatforms::PlatformId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_watchlist_user_content")
                    .table(Watchlist::Table)
                    .col(Watchlist::UserId)
                    .col(Watchlist::ContentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Browse queries sort on these.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contents_average_rating")
                    .table(Contents::Table)
                    .col(Contents::AverageRating)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contents_release_year")
                    .table(Contents::Table)
                    .col(Contents::ReleaseYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contents_watchmode_id")
                    .table(Contents::Table)
                    .col(Contents::WatchmodeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_contents_watchmode_id",
            "idx_contents_release_year",
            "idx_contents_average_rating",
            "idx_watchlist_user_content",
            "idx_content_platforms_content_platform",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ContentPlatforms {
    Table,
    ContentId,
    PlatformId,
}

#[derive(DeriveIden)]
enum Watchlist {
    Table,
    UserId,
    ContentId,
}

#[derive(DeriveIden)]
enum Contents {
    Table,
    AverageRating,
    ReleaseYear,
    WatchmodeId,
}
