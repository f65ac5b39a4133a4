//! Configuration persistence port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::config::SystemConfig;

/// Storage for the single [`SystemConfig`] blob.
///
/// `save` replaces the stored configuration wholesale; there is no field-level
/// merge at this layer.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration, or defaults when nothing is stored yet.
    async fn load(&self) -> Result<SystemConfig, RepositoryError>;

    /// Persist the whole configuration.
    async fn save(&self, config: &SystemConfig) -> Result<(), RepositoryError>;
}
