use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;

/// 前缀下的一个直接子节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNode {
    pub key: String,
    pub value: String,
}

/// 带 TTL 的层级键值存储能力
///
/// 键以 `/` 分隔层级，值对存储而言是不透明字符串。实现必须可以被多个
/// 注册器和解析器并发使用。
#[async_trait]
pub trait StoreClient: Send + Sync + std::fmt::Debug {
    /// 创建或覆盖键，旧值和旧 TTL 一并丢弃
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// 删除键；键不存在时返回 `StoreError::KeyNotFound`
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// 列出前缀下的所有直接子节点
    async fn get_children(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError>;
}
