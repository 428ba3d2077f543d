use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

/// Shared Redis connection used for best-effort caching. Every accessor
/// degrades to a miss/no-op when the connection is absent, so the engine
/// never depends on Redis being up.
#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    pub(crate) async fn cache_get(&self, key: &str) -> Option<String> {
        let manager = { self.manager.read().await.clone() };
        let mut manager = manager?;

        match cmd("GET").arg(key).query_async::<_, Option<String>>(&mut manager).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, key, "Cache read failed");
                None
            }
        }
    }

    pub(crate) async fn cache_set(&self, key: &str, value: &str, ttl_seconds: u64) {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return;
        };

        if let Err(err) = cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<_, ()>(&mut manager)
            .await
        {
            tracing::debug!(error = %err, key, "Cache write failed");
        }
    }

    pub(crate) async fn cache_delete(&self, key: &str) {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return;
        };

        if let Err(err) = cmd("DEL").arg(key).query_async::<_, ()>(&mut manager).await {
            tracing::debug!(error = %err, key, "Cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RedisHandle, RedisHealth};

    #[tokio::test]
    async fn disconnected_handle_degrades_to_miss() {
        let redis = RedisHandle::new("redis://localhost:6379/0".to_string());

        assert!(matches!(redis.health().await, RedisHealth::Disconnected));
        assert!(redis.cache_get("stats:exam:any").await.is_none());

        // No-ops rather than errors when the manager was never connected.
        redis.cache_set("stats:exam:any", "{}", 60).await;
        redis.cache_delete("stats:exam:any").await;
    }
}
