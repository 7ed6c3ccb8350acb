use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RegistryError;

/// 注册条目在存储中的存活时间
pub const TTL: Duration = Duration::from_secs(30);
/// 续期周期，必须小于 TTL
pub const KEEP_ALIVE_PERIOD: Duration = Duration::from_secs(20);
/// 续期失败后的重试间隔
pub const KEEP_ALIVE_RETRY_DELAY: Duration = Duration::from_secs(5);

pub const KEY_SEPARATOR: char = '/';

/// 注册身份：服务名、实例名和对外地址，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationIdentity {
    service_name: String,
    instance_name: String,
    base_url: String,
}

impl RegistrationIdentity {
    pub fn new(
        service_name: impl Into<String>,
        instance_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let identity = Self {
            service_name: service_name.into(),
            instance_name: instance_name.into(),
            base_url: base_url.into(),
        };

        validate_segment("service name", &identity.service_name)?;
        validate_segment("instance name", &identity.instance_name)?;
        if identity.base_url.trim().is_empty() {
            return Err(RegistryError::InvalidIdentity(
                "base url must not be empty".to_string(),
            ));
        }

        Ok(identity)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 存储键 `<service>/<instance>`
    pub fn key(&self) -> String {
        build_key(&self.service_name, &self.instance_name)
    }
}

/// 写入存储的注册条目
///
/// 线上格式为 `{"BaseURL": "..."}`，读取时兼容旧的 `BaseUrl` 字段名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    #[serde(rename = "BaseURL", alias = "BaseUrl")]
    pub base_url: String,
}

impl RegistrationEntry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn encode(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

pub fn build_key(service_name: &str, instance_name: &str) -> String {
    format!("{service_name}{KEY_SEPARATOR}{instance_name}")
}

// 键的每一段都不能为空，也不能包含分隔符
pub(crate) fn validate_segment(kind: &str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::InvalidIdentity(format!(
            "{kind} must not be empty"
        )));
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(RegistryError::InvalidIdentity(format!(
            "{kind} {value:?} must not contain '{KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}
