//! Configuration service: load, merge, validate and persist the system config.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{
    ApiKey, ConfigError, NewApiKey, SystemConfig, SystemConfigUpdate, validate_config,
};
use crate::ports::{ConfigStore, CoreError};

/// Reply to a `system_config` request. Secrets are always masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReply {
    pub status: String,
    pub message: String,
    pub config: SystemConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<Vec<ApiKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<ApiKey>,
    pub timestamp: DateTime<Utc>,
}

impl ConfigReply {
    fn success(message: impl Into<String>, config: &SystemConfig) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            config: config.masked(),
            api_keys: None,
            key: None,
            timestamp: Utc::now(),
        }
    }
}

/// Service for configuration reads and mutations.
///
/// Mutations hold a lock across load, modify and save so concurrent clients
/// never lose each other's writes.
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    write_lock: Mutex<()>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Current configuration, unmasked. Never send this to a client.
    pub async fn current(&self) -> Result<SystemConfig, CoreError> {
        self.store.load().await.map_err(CoreError::from)
    }

    pub async fn get(&self) -> Result<ConfigReply, CoreError> {
        let config = self.current().await?;
        Ok(ConfigReply::success("Configuration loaded", &config))
    }

    pub async fn update(&self, update: &SystemConfigUpdate) -> Result<ConfigReply, CoreError> {
        let config = self
            .mutate(|config| {
                config.merge(update);
                Ok(())
            })
            .await?;
        Ok(ConfigReply::success("Configuration updated successfully", &config))
    }

    pub async fn api_keys(&self) -> Result<ConfigReply, CoreError> {
        let config = self.current().await?;
        let mut reply = ConfigReply::success("API keys loaded", &config);
        reply.api_keys = Some(config.api_key_list.iter().map(ApiKey::masked).collect());
        Ok(reply)
    }

    /// Store a new key. An active key deactivates the provider's other keys.
    pub async fn save_api_key(&self, input: NewApiKey) -> Result<ConfigReply, CoreError> {
        if input.provider.trim().is_empty() {
            return Err(ConfigError::EmptyKeyProvider.into());
        }
        if input.value.trim().is_empty() {
            return Err(ConfigError::EmptyKeyValue.into());
        }

        let key = ApiKey {
            id: uuid::Uuid::new_v4().to_string(),
            name: input
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{} key", input.provider)),
            provider: input.provider,
            value: input.value,
            active: input.active,
            created_at: Utc::now(),
        };
        let saved = key.clone();
        let config = self
            .mutate(move |config| {
                if key.active {
                    deactivate_provider(config, &key.provider);
                }
                config.api_key_list.push(key);
                Ok(())
            })
            .await?;

        let mut reply = ConfigReply::success("API key saved", &config);
        reply.key = Some(saved.masked());
        Ok(reply)
    }

    pub async fn delete_api_key(&self, key_id: &str) -> Result<ConfigReply, CoreError> {
        let config = self
            .mutate(|config| {
                let before = config.api_key_list.len();
                config.api_key_list.retain(|k| k.id != key_id);
                if config.api_key_list.len() == before {
                    return Err(ConfigError::KeyNotFound(key_id.to_string()));
                }
                Ok(())
            })
            .await?;
        Ok(ConfigReply::success("API key deleted", &config))
    }

    /// Make `key_id` the only active key of its provider.
    pub async fn set_active_api_key(&self, key_id: &str) -> Result<ConfigReply, CoreError> {
        let config = self
            .mutate(|config| {
                let provider = config
                    .api_key_list
                    .iter()
                    .find(|k| k.id == key_id)
                    .map(|k| k.provider.clone())
                    .ok_or_else(|| ConfigError::KeyNotFound(key_id.to_string()))?;
                deactivate_provider(config, &provider);
                for key in config.api_key_list.iter_mut().filter(|k| k.id == key_id) {
                    key.active = true;
                }
                Ok(())
            })
            .await?;
        Ok(ConfigReply::success("Active API key updated", &config))
    }

    async fn mutate(
        &self,
        change: impl FnOnce(&mut SystemConfig) -> Result<(), ConfigError>,
    ) -> Result<SystemConfig, CoreError> {
        let _guard = self.write_lock.lock().await;
        let mut config = self.store.load().await?;
        change(&mut config)?;
        validate_config(&config)?;
        config.updated_at = Some(Utc::now());
        self.store.save(&config).await?;
        tracing::info!(target: "iosrag.config", "Configuration saved");
        Ok(config)
    }
}

fn deactivate_provider(config: &mut SystemConfig, provider: &str) {
    for key in config
        .api_key_list
        .iter_mut()
        .filter(|k| k.provider == provider)
    {
        key.active = false;
    }
}
