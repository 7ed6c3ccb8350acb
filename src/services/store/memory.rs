use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::time::Instant;

use super::error::StoreError;
use super::types::{StoreClient, StoreNode};

// 内存条目
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// 进程内的 TTL 键值存储
///
/// 目录语义沿用 etcd 键目录的行为：写入键时隐式创建父目录，目录在子键过期或删除后
/// 仍然保留；查询从未创建过的前缀返回 `KeyNotFound`。过期在读写时惰性清理，
/// 时钟使用 tokio 的 `Instant`，因此在暂停时间的测试中同样生效。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
    directories: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前未过期的键数量
    pub fn live_keys(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.value().expires_at > now)
            .count()
    }

    // 清理过期的键
    fn purge_expired(&self) {
        let now = Instant::now();
        let mut expired = Vec::new();

        for entry in self.entries.iter() {
            if entry.value().expires_at <= now {
                expired.push(entry.key().clone());
            }
        }

        for key in expired {
            if self
                .entries
                .remove_if(&key, |_, entry| entry.expires_at <= now)
                .is_some()
            {
                tracing::debug!(key = %key, "Removed expired key from memory store");
            }
        }
    }
}

fn normalize(key: &str) -> &str {
    key.trim_matches('/')
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let key = normalize(key);

        let mut parent = key;
        while let Some((dir, _)) = parent.rsplit_once('/') {
            self.directories.insert(dir.to_string());
            parent = dir;
        }

        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.purge_expired();

        let key = normalize(key);
        match self.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::KeyNotFound(key.to_string())),
        }
    }

    async fn get_children(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError> {
        self.purge_expired();

        let prefix = normalize(prefix);
        if !self.directories.contains(prefix) {
            return Err(StoreError::KeyNotFound(prefix.to_string()));
        }

        let child_prefix = format!("{prefix}/");
        let mut nodes: Vec<StoreNode> = self
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .key()
                    .strip_prefix(&child_prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|entry| StoreNode {
                key: entry.key().clone(),
                value: entry.value().value.clone(),
            })
            .collect();

        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_set_and_list_children() {
        let store = MemoryStore::new();
        store.set("svc/b", "2", TTL).await.unwrap();
        store.set("svc/a", "1", TTL).await.unwrap();
        store.set("other/x", "3", TTL).await.unwrap();

        let children = store.get_children("svc").await.unwrap();
        let keys: Vec<_> = children.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["svc/a", "svc/b"]);
        assert_eq!(children[0].value, "1");
    }

    #[tokio::test]
    async fn test_only_direct_children_listed() {
        let store = MemoryStore::new();
        store.set("svc/a", "1", TTL).await.unwrap();
        store.set("svc/nested/deep", "2", TTL).await.unwrap();

        let children = store.get_children("/svc").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].key, "svc/a");
    }

    #[tokio::test]
    async fn test_unknown_prefix_is_key_not_found() {
        let store = MemoryStore::new();
        let err = store.get_children("missing").await.unwrap_err();
        assert!(err.is_key_not_found());
    }

    #[tokio::test]
    async fn test_directory_survives_last_child() {
        let store = MemoryStore::new();
        store.set("svc/a", "1", TTL).await.unwrap();
        store.delete("svc/a").await.unwrap();

        assert!(store.get_children("svc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_key_fails() {
        let store = MemoryStore::new();
        assert!(store.delete("svc/a").await.unwrap_err().is_key_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set("svc/a", "1", TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(store.get_children("svc").await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get_children("svc").await.unwrap().is_empty());
        assert_eq!(store.live_keys(), 0);
        assert!(store.delete("svc/a").await.unwrap_err().is_key_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl() {
        let store = MemoryStore::new();
        store.set("svc/a", "1", TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        store.set("svc/a", "2", TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let children = store.get_children("svc").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].value, "2");
    }
}
