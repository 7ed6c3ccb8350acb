/// 协调存储错误类型
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No store endpoints configured")]
    NoEndpoints,
    #[error("Invalid store endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("etcd error: {0}")]
    Etcd(#[from] etcd_client::Error),
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, StoreError::KeyNotFound(_))
    }
}
