use std::sync::Arc;

use async_trait::async_trait;

use super::error::RegistryError;
use super::registrar::Registrar;
use super::resolver::Resolver;
use super::types::RegistrationIdentity;
use crate::config::DiscoveryConfig;
use crate::services::store::{EtcdStore, StoreClient};

/// 服务注册与发现客户端接口
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 注册当前实例
    async fn register(&mut self) -> Result<(), RegistryError>;

    /// 注销当前实例
    async fn unregister(&mut self) -> Result<(), RegistryError>;

    /// 查询服务名下的所有实例地址
    async fn services_by_name(&self, name: &str) -> Result<Vec<String>, RegistryError>;
}

/// 组合注册器和解析器，共享同一个存储客户端
#[derive(Debug)]
pub struct DiscoveryClient {
    registrar: Registrar,
    resolver: Resolver,
}

impl DiscoveryClient {
    /// 根据配置连接 etcd
    pub async fn connect(config: &DiscoveryConfig) -> Result<Self, RegistryError> {
        let identity = config.identity()?;
        let store = EtcdStore::connect(&config.etcd_endpoints).await?;

        tracing::info!(
            endpoints = ?config.etcd_endpoints,
            service_name = %identity.service_name(),
            "Created etcd registry client"
        );

        Ok(Self::with_store(Arc::new(store), identity))
    }

    pub fn with_store(store: Arc<dyn StoreClient>, identity: RegistrationIdentity) -> Self {
        Self {
            registrar: Registrar::new(store.clone(), identity),
            resolver: Resolver::new(store),
        }
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

#[async_trait]
impl RegistryClient for DiscoveryClient {
    async fn register(&mut self) -> Result<(), RegistryError> {
        self.registrar.register().await
    }

    async fn unregister(&mut self) -> Result<(), RegistryError> {
        self.registrar.unregister().await
    }

    async fn services_by_name(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        self.resolver.services_by_name(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{MemoryStore, StoreError};

    fn config(endpoints: Vec<String>) -> DiscoveryConfig {
        DiscoveryConfig {
            etcd_endpoints: endpoints,
            service_name: "test".to_string(),
            instance_name: "test1".to_string(),
            base_url: "127.0.0.1:8080".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_endpoints() {
        let err = DiscoveryClient::connect(&config(Vec::new())).await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(StoreError::NoEndpoints)));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_endpoint() {
        let err = DiscoveryClient::connect(&config(vec!["ftp://127.0.0.1:2379".to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Store(StoreError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_validates_identity_first() {
        let mut config = config(vec!["http://127.0.0.1:2379".to_string()]);
        config.instance_name = "a/b".to_string();
        let err = DiscoveryClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIdentity(_)));
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let identity = RegistrationIdentity::new("test", "test1", "127.0.0.1:8080").unwrap();
        let mut client = DiscoveryClient::with_store(Arc::new(MemoryStore::new()), identity);

        client.register().await.unwrap();
        assert_eq!(
            client.services_by_name("test").await.unwrap(),
            vec!["127.0.0.1:8080".to_string()]
        );

        client.unregister().await.unwrap();
        assert!(client.services_by_name("test").await.unwrap().is_empty());
    }
}
