use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client as EtcdClient, ConnectOptions, GetOptions, PutOptions};

use super::error::StoreError;
use super::types::{StoreClient, StoreNode};

/// 每个请求的超时时间
pub const HEADER_TIMEOUT_PER_REQUEST: Duration = Duration::from_secs(1);

/// 建立连接的超时时间
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// 基于 etcd v3 的存储客户端
///
/// 每次 `set` 都申请一个新的租约并把键挂到该租约上，键的旧租约随之解除，
/// 由 etcd 在到期后自行回收。端点之间的负载均衡和故障切换由 `etcd_client` 的
/// 通道完成。
#[derive(Clone)]
pub struct EtcdStore {
    client: EtcdClient,
    endpoints: Vec<String>,
}

impl std::fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdStore")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl EtcdStore {
    /// 使用默认超时连接 etcd
    pub async fn connect(endpoints: &[String]) -> Result<Self, StoreError> {
        Self::connect_with_timeout(endpoints, HEADER_TIMEOUT_PER_REQUEST).await
    }

    pub async fn connect_with_timeout(
        endpoints: &[String],
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let endpoints = validate_endpoints(endpoints)?;

        let options = ConnectOptions::new()
            .with_timeout(timeout)
            .with_connect_timeout(CONNECT_TIMEOUT);
        let client = EtcdClient::connect(&endpoints, Some(options))
            .await
            .map_err(classify)?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

#[async_trait]
impl StoreClient for EtcdStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut client = self.client.clone();

        let lease = client
            .lease_grant(lease_ttl(ttl), None)
            .await
            .map_err(classify)?;
        client
            .put(key, value, Some(PutOptions::new().with_lease(lease.id())))
            .await
            .map_err(classify)?;

        tracing::trace!(key = %key, lease_id = lease.id(), "Stored key with lease");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut client = self.client.clone();
        let response = client.delete(key, None).await.map_err(classify)?;
        deletion_result(key, response.deleted())
    }

    async fn get_children(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError> {
        let mut client = self.client.clone();
        let child_prefix = format!("{}/", prefix.trim_matches('/'));

        let response = client
            .get(child_prefix.as_str(), Some(GetOptions::new().with_prefix()))
            .await
            .map_err(classify)?;

        let mut pairs = Vec::with_capacity(response.kvs().len());
        for kv in response.kvs() {
            pairs.push((
                kv.key_str().map_err(classify)?.to_string(),
                kv.value_str().map_err(classify)?.to_string(),
            ));
        }

        Ok(direct_children(&child_prefix, pairs))
    }
}

fn validate_endpoints(endpoints: &[String]) -> Result<Vec<String>, StoreError> {
    if endpoints.is_empty() {
        return Err(StoreError::NoEndpoints);
    }

    endpoints
        .iter()
        .map(|endpoint| {
            let endpoint = endpoint.trim();
            let invalid = |reason: &str| StoreError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: reason.to_string(),
            };

            if endpoint.is_empty() {
                return Err(invalid("empty endpoint"));
            }
            if let Some((scheme, rest)) = endpoint.split_once("://") {
                if scheme != "http" && scheme != "https" {
                    return Err(invalid("unsupported scheme"));
                }
                if rest.is_empty() {
                    return Err(invalid("missing host"));
                }
            }
            Ok(endpoint.to_string())
        })
        .collect()
}

// etcd 租约以秒为单位，且至少为 1
fn lease_ttl(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1)
}

fn deletion_result(key: &str, deleted: i64) -> Result<(), StoreError> {
    if deleted == 0 {
        Err(StoreError::KeyNotFound(key.to_string()))
    } else {
        Ok(())
    }
}

// 前缀查询会返回所有后代，这里只保留直接子节点
fn direct_children<I>(child_prefix: &str, pairs: I) -> Vec<StoreNode>
where
    I: IntoIterator<Item = (String, String)>,
{
    pairs
        .into_iter()
        .filter(|(key, _)| {
            key.strip_prefix(child_prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
        })
        .map(|(key, value)| StoreNode { key, value })
        .collect()
}

// 连接层失败归为不可用，其余保留 etcd 原始错误
fn classify(error: etcd_client::Error) -> StoreError {
    match error {
        etcd_client::Error::TransportError(e) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Etcd(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_endpoint_validation() {
        let endpoints = validate_endpoints(&[
            "http://127.0.0.1:2379".to_string(),
            " 10.0.0.2:2379 ".to_string(),
        ])
        .unwrap();
        assert_eq!(endpoints, vec!["http://127.0.0.1:2379", "10.0.0.2:2379"]);

        assert!(matches!(validate_endpoints(&[]), Err(StoreError::NoEndpoints)));
        assert!(matches!(
            validate_endpoints(&["ftp://127.0.0.1:2379".to_string()]),
            Err(StoreError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            validate_endpoints(&["http://".to_string()]),
            Err(StoreError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            validate_endpoints(&["  ".to_string()]),
            Err(StoreError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_endpoints() {
        assert!(matches!(
            EtcdStore::connect(&[]).await,
            Err(StoreError::NoEndpoints)
        ));
    }

    #[test]
    fn test_lease_ttl_in_whole_seconds() {
        assert_eq!(lease_ttl(Duration::from_secs(30)), 30);
        assert_eq!(lease_ttl(Duration::from_millis(1500)), 1);
        assert_eq!(lease_ttl(Duration::from_millis(200)), 1);
        assert_eq!(lease_ttl(Duration::ZERO), 1);
    }

    #[test]
    fn test_delete_of_absent_key_is_key_not_found() {
        assert!(deletion_result("test/test1", 1).is_ok());
        let err = deletion_result("test/test1", 0).unwrap_err();
        assert!(err.is_key_not_found());
        assert_eq!(err.to_string(), "Key not found: test/test1");
    }

    #[test]
    fn test_prefix_get_keeps_direct_children_only() {
        let nodes = direct_children(
            "test/",
            vec![
                pair("test/test1", r#"{"BaseURL":"127.0.0.1:8080"}"#),
                pair("test/nested/deep", "x"),
                pair("test/", "dir marker"),
                pair("test/test2", r#"{"BaseURL":"127.0.0.1:8081"}"#),
                pair("testing/other", "y"),
            ],
        );

        let keys: Vec<_> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["test/test1", "test/test2"]);
        assert_eq!(nodes[1].value, r#"{"BaseURL":"127.0.0.1:8081"}"#);
    }

    #[test]
    fn test_empty_prefix_result() {
        assert!(direct_children("test/", Vec::new()).is_empty());
    }

    #[test]
    fn test_error_classification() {
        let err = classify(etcd_client::Error::InvalidArgs("bad lease".to_string()));
        assert!(matches!(err, StoreError::Etcd(_)));
    }
}
