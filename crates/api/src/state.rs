// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the asset import
//! server, including configuration, the provider registry, the media pool
//! and coordinated cancellation.

use std::{collections::BTreeMap, sync::Arc};

use external_apis::{DirectImporter, ProviderRegistry};
use media_pool::{Downloader, MediaPool};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    config: ServerConfig,
    registry: Arc<ProviderRegistry>,
    media_pool: MediaPool,
    downloader: Downloader,
    direct_importer: DirectImporter,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        registry: Arc<ProviderRegistry>,
        media_pool: MediaPool,
        downloader: Downloader,
        direct_importer: DirectImporter,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            media_pool,
            downloader,
            direct_importer,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Registered media providers
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Media pool imports land in
    pub fn media_pool(&self) -> &MediaPool {
        &self.media_pool
    }

    /// Downloader used for provider imports
    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Importer for arbitrary URLs
    pub fn direct_importer(&self) -> &DirectImporter {
        &self.direct_importer
    }

    /// Check the database and every registered provider
    ///
    /// The service is `Down` when the database is unreachable and `Degraded`
    /// when a configured provider is down.
    pub async fn health_check(&self) -> HealthCheck {
        let not_configured = api_client::HealthStatus::not_configured();
        let mut down = Vec::new();

        let providers: BTreeMap<_, _> = self
            .registry
            .overall_health()
            .await
            .into_iter()
            .map(|(name, result)| {
                if result.status.is_down() && result.status != not_configured {
                    down.push(name.clone());
                }
                let health = ProviderHealth {
                    status: result.status.into(),
                    response_time_ms: u64::try_from(result.response_time.as_millis())
                        .unwrap_or(u64::MAX),
                };
                (name, health)
            })
            .collect();

        let status = match sqlx::query("SELECT 1")
            .execute(self.media_pool.database())
            .await
        {
            Err(error) => {
                warn!(%error, "database health check failed");
                HealthStatus::Down {
                    reason: format!("database unavailable: {error}"),
                }
            }
            Ok(_) if down.is_empty() => HealthStatus::Up,
            Ok(_) => HealthStatus::Degraded {
                reason: format!("providers down: {}", down.join(", ")),
            },
        };

        HealthCheck {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            providers,
        }
    }
}

/// Health status of a service or dependency
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: String,
    },

    /// Service is operational but experiencing performance issues or partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: String,
    },
}

impl From<api_client::HealthStatus> for HealthStatus {
    fn from(status: api_client::HealthStatus) -> Self {
        match status {
            api_client::HealthStatus::Up => Self::Up,
            api_client::HealthStatus::Degraded { reason } => Self::Degraded { reason },
            api_client::HealthStatus::Down { reason } => Self::Down { reason },
        }
    }
}

/// Health of one provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderHealth {
    /// Provider status
    pub status: HealthStatus,
    /// Duration of the check in milliseconds
    pub response_time_ms: u64,
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: String,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of individual providers
    #[schema(value_type = Object)]
    pub providers: BTreeMap<String, ProviderHealth>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_conversion() {
        assert_eq!(
            HealthStatus::from(api_client::HealthStatus::Up),
            HealthStatus::Up
        );
        assert_eq!(
            HealthStatus::from(api_client::HealthStatus::not_configured()),
            HealthStatus::Down {
                reason: "Provider is not configured".to_string()
            }
        );
    }
}
