use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::entities::{platforms, prelude::*};

pub struct PlatformRepository {
    conn: DatabaseConnection,
}

impl PlatformRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<platforms::Model>> {
        Ok(Platforms::find()
            .order_by_asc(platforms::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<platforms::Model>> {
        Ok(Platforms::find_by_id(id).one(&self.conn).await?)
    }

    /// Platforms are created lazily as sync discovers new catalog sources.
    pub async fn get_or_create_by_source_id(
        &self,
        source_id: i32,
        name: &str,
        logo_url: Option<&str>,
    ) -> Result<platforms::Model> {
        if let Some(existing) = Platforms::find()
            .filter(platforms::Column::SourceId.eq(source_id))
            .one(&self.conn)
            .await?
        {
            return Ok(existing);
        }

        let key = slugify(name);
        let model = platforms::ActiveModel {
            id: NotSet,
            key: Set(key),
            name: Set(name.to_string()),
            source_id: Set(source_id),
            logo_url: Set(logo_url.map(ToString::to_string)),
        }
        .insert(&self.conn)
        .await?;

        info!(id = model.id, name = %model.name, source_id, "Created platform");
        Ok(model)
    }

    pub async fn update_logo(&self, id: i32, logo_url: &str) -> Result<Option<platforms::Model>> {
        let Some(model) = Platforms::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut active: platforms::ActiveModel = model.into();
        active.logo_url = Set(Some(logo_url.to_string()));
        Ok(Some(active.update(&self.conn).await?))
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Netflix"), "netflix");
        assert_eq!(slugify("Amazon Prime Video"), "amazon-prime-video");
        assert_eq!(slugify("HBO Max  (US)"), "hbo-max-us");
    }
}
