use crate::core::profile::{ProfileError, UserProfile, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonUserStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, UserProfile>>,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = if path.exists() {
            let file = std::fs::File::open(&path).expect("Failed to open user profiles");
            let map: HashMap<String, UserProfile> =
                serde_json::from_reader(file).unwrap_or_default();
            RwLock::new(map)
        } else {
            RwLock::new(HashMap::new())
        };

        Self { path, cache }
    }

    async fn persist(&self) -> Result<(), ProfileError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)
            .map_err(|e| ProfileError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, &*cache)
            .map_err(|e| ProfileError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, ProfileError> {
        let cache = self.cache.read().await;
        Ok(cache.get(user_id).cloned())
    }

    async fn save(&self, profile: UserProfile) -> Result<(), ProfileError> {
        let mut cache = self.cache.write().await;
        cache.insert(profile.id.clone(), profile);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn all(&self) -> Result<Vec<UserProfile>, ProfileError> {
        let cache = self.cache.read().await;
        Ok(cache.values().cloned().collect())
    }
}
