use std::sync::Arc;

use super::error::RegistryError;
use super::types::{RegistrationEntry, validate_segment};
use crate::services::store::StoreClient;

/// 无状态的服务发现查询
#[derive(Debug, Clone)]
pub struct Resolver {
    store: Arc<dyn StoreClient>,
}

impl Resolver {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// 列出某个服务名下当前存活的所有实例地址
    ///
    /// 结果保持存储返回子节点的顺序。无法解析的条目会被跳过；从未注册过的服务名
    /// 返回空列表。读取失败时返回错误，而不是空列表。
    pub async fn services_by_name(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        validate_segment("service name", name)?;

        let nodes = match self.store.get_children(name).await {
            Ok(nodes) => nodes,
            Err(e) if e.is_key_not_found() => {
                tracing::debug!(service_name = %name, "No registrations found for service");
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!(service_name = %name, error = %e, "Failed to query service registrations");
                return Err(e.into());
            }
        };

        let addresses = nodes
            .into_iter()
            .filter_map(|node| match RegistrationEntry::decode(&node.value) {
                Ok(entry) => Some(entry.base_url),
                Err(e) => {
                    tracing::debug!(
                        service_name = %name,
                        key = %node.key,
                        error = %e,
                        "Skipping malformed registration entry"
                    );
                    None
                }
            })
            .collect();

        Ok(addresses)
    }
}
