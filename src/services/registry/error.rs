use crate::services::store::StoreError;

/// 服务注册/发现错误类型
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid registration identity: {0}")]
    InvalidIdentity(String),
    #[error("Instance already registered under key {0}")]
    AlreadyRegistered(String),
    #[error("Instance is not registered")]
    NotRegistered,
}
