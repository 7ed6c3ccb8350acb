use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::error::RegistryError;
use super::types::{
    KEEP_ALIVE_PERIOD, KEEP_ALIVE_RETRY_DELAY, RegistrationEntry, RegistrationIdentity, TTL,
};
use crate::services::store::StoreClient;

/// 单个服务实例的注册生命周期
///
/// `register` 同步写入一次条目并启动后台续期任务，`unregister` 取消续期并删除条目。
/// 生命周期方法需要 `&mut self`，同一实例上的调用天然是串行的。
#[derive(Debug)]
pub struct Registrar {
    store: Arc<dyn StoreClient>,
    identity: RegistrationIdentity,
    runtime: Option<RegistrationRuntime>,
}

// 只在 register 成功到 unregister 之间存在
#[derive(Debug)]
struct RegistrationRuntime {
    key: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Registrar {
    pub fn new(store: Arc<dyn StoreClient>, identity: RegistrationIdentity) -> Self {
        Self {
            store,
            identity,
            runtime: None,
        }
    }

    pub fn identity(&self) -> &RegistrationIdentity {
        &self.identity
    }

    pub fn is_registered(&self) -> bool {
        self.runtime.is_some()
    }

    /// 当前注册使用的存储键
    pub fn key(&self) -> Option<&str> {
        self.runtime.as_ref().map(|runtime| runtime.key.as_str())
    }

    /// 后台续期任务是否仍在运行
    pub fn is_refreshing(&self) -> bool {
        self.runtime
            .as_ref()
            .is_some_and(|runtime| !runtime.task.is_finished())
    }

    /// 发布注册条目并启动续期任务
    ///
    /// 返回 `Ok` 时条目已对读者可见；写入失败时不会启动任何后台任务。
    pub async fn register(&mut self) -> Result<(), RegistryError> {
        if let Some(runtime) = &self.runtime {
            return Err(RegistryError::AlreadyRegistered(runtime.key.clone()));
        }

        let key = self.identity.key();
        let value = RegistrationEntry::new(self.identity.base_url()).encode()?;

        if let Err(e) = self.store.set(&key, &value, TTL).await {
            tracing::error!(
                service_name = %self.identity.service_name(),
                key = %key,
                error = %e,
                "Failed to publish service registration"
            );
            return Err(e.into());
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(keep_alive(
            self.store.clone(),
            key.clone(),
            value,
            self.identity.service_name().to_string(),
            cancel.clone(),
        ));

        tracing::info!(
            service_name = %self.identity.service_name(),
            instance_name = %self.identity.instance_name(),
            base_url = %self.identity.base_url(),
            ttl_secs = TTL.as_secs(),
            "Registered service instance"
        );

        self.runtime = Some(RegistrationRuntime { key, cancel, task });
        Ok(())
    }

    /// 停止续期并删除注册条目
    ///
    /// 取消信号总是先于删除发出，且不等待后台任务退出。删除失败时仍然回到未注册状态，
    /// 残留的条目由 TTL 兜底过期。
    pub async fn unregister(&mut self) -> Result<(), RegistryError> {
        let RegistrationRuntime { key, cancel, task } =
            self.runtime.take().ok_or(RegistryError::NotRegistered)?;

        cancel.cancel();
        drop(task);

        match self.store.delete(&key).await {
            Ok(()) => {
                tracing::info!(
                    service_name = %self.identity.service_name(),
                    key = %key,
                    "Unregistered service instance"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    service_name = %self.identity.service_name(),
                    key = %key,
                    error = %e,
                    "Failed to delete service registration, entry will expire after TTL"
                );
                Err(e.into())
            }
        }
    }
}

impl Drop for Registrar {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.cancel.cancel();
            tracing::warn!(
                service_name = %self.identity.service_name(),
                key = %runtime.key,
                "Registrar dropped while registered, entry will expire after TTL"
            );
        }
    }
}

// 续期循环：只在等待点检查取消信号，不打断进行中的存储调用
async fn keep_alive(
    store: Arc<dyn StoreClient>,
    key: String,
    value: String,
    service_name: String,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + KEEP_ALIVE_PERIOD, KEEP_ALIVE_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(service_name = %service_name, "Shutdown keep alive routine");
                return;
            }
            _ = ticker.tick() => {}
        }

        match store.set(&key, &value, TTL).await {
            Ok(()) => {
                tracing::debug!(service_name = %service_name, key = %key, "Keep alive routine refreshed registration");
            }
            Err(e) => {
                tracing::warn!(
                    service_name = %service_name,
                    key = %key,
                    error = %e,
                    retry_in_secs = KEEP_ALIVE_RETRY_DELAY.as_secs(),
                    "Keep alive refresh failed"
                );
                ticker.reset_after(KEEP_ALIVE_RETRY_DELAY);
            }
        }
    }
}
