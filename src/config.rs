use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::services::registry::types::validate_segment;
use crate::services::registry::{RegistrationIdentity, RegistryError};

pub const DEFAULT_CONFIG_PATH: &str = "discovery.toml";
pub const ENV_PREFIX: &str = "DISCOVERY_";

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid environment config: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 注册客户端配置，所有字段都是必填项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// etcd 端点列表
    pub etcd_endpoints: Vec<String>,
    pub service_name: String,
    pub instance_name: String,
    /// 其他服务访问本实例使用的地址
    pub base_url: String,
}

impl DiscoveryConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// 读取默认配置文件；文件不存在时回退到环境变量，其他错误直接返回
    pub fn load_or_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_or_vars(DEFAULT_CONFIG_PATH, std::env::vars())
    }

    pub fn load_or_vars<I>(path: impl AsRef<Path>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let path = path.as_ref();
        match Self::load_from(path) {
            Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, reading environment");
                Self::from_vars(vars)
            }
            result => result,
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: DiscoveryConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// 从环境变量读取（前缀 `DISCOVERY_`），会先加载 `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: DiscoveryConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.etcd_endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "etcd_endpoints must not be empty".to_string(),
            ));
        }
        if self.etcd_endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "etcd_endpoints must not contain blank entries".to_string(),
            ));
        }

        let invalid = |e: RegistryError| ConfigError::Invalid(e.to_string());
        validate_segment("service name", &self.service_name).map_err(invalid)?;
        validate_segment("instance name", &self.instance_name).map_err(invalid)?;

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn identity(&self) -> Result<RegistrationIdentity, RegistryError> {
        RegistrationIdentity::new(&self.service_name, &self.instance_name, &self.base_url)
    }
}
