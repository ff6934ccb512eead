use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::{video, Video};

/// Fields for a new row. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub external_asset_id: String,
    pub original_size_bytes: String,
    pub compressed_size_bytes: String,
    pub duration_seconds: f64,
}

#[derive(Debug, thiserror::Error)]
#[error("video store error: {0}")]
pub struct StoreError(#[from] pub DbErr);

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, new_video: NewVideo) -> Result<video::Model, StoreError>;

    /// Every row, most recent `created_at` first.
    async fn list_newest_first(&self) -> Result<Vec<video::Model>, StoreError>;
}

#[derive(Clone)]
pub struct SeaOrmVideoStore {
    db: DatabaseConnection,
}

impl SeaOrmVideoStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SeaOrmVideoStore {
    async fn create(&self, new_video: NewVideo) -> Result<video::Model, StoreError> {
        let now = Utc::now().fixed_offset();
        let row = video::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_video.title),
            description: Set(new_video.description),
            external_asset_id: Set(new_video.external_asset_id),
            original_size_bytes: Set(new_video.original_size_bytes),
            compressed_size_bytes: Set(new_video.compressed_size_bytes),
            duration_seconds: Set(new_video.duration_seconds),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(row.insert(&self.db).await?)
    }

    async fn list_newest_first(&self) -> Result<Vec<video::Model>, StoreError> {
        Ok(Video::find()
            .order_by_desc(video::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::Migrator;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    async fn sqlite_store() -> SeaOrmVideoStore {
        // One pooled connection so the in-memory database survives.
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmVideoStore::new(db)
    }

    fn new_video(external_id: &str) -> NewVideo {
        NewVideo {
            title: format!("clip {external_id}"),
            description: String::new(),
            external_asset_id: external_id.to_string(),
            original_size_bytes: "10000000".to_string(),
            compressed_size_bytes: "4000000".to_string(),
            duration_seconds: 125.0,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_matching_timestamps() {
        let store = sqlite_store().await;
        let created = store.create(new_video("vids/a")).await.unwrap();

        assert!(!created.id.is_nil());
        assert_eq!(created.external_asset_id, "vids/a");
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.compressed_size_bytes, "4000000");
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = sqlite_store().await;
        for id in ["vids/a", "vids/b", "vids/c"] {
            store.create(new_video(id)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let listed = store.list_newest_first().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|v| v.external_asset_id.as_str()).collect();
        assert_eq!(ids, ["vids/c", "vids/b", "vids/a"]);
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn duplicate_external_id_is_rejected() {
        let store = sqlite_store().await;
        store.create(new_video("vids/a")).await.unwrap();
        assert!(store.create(new_video("vids/a")).await.is_err());
    }
}
