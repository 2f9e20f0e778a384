// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types and utilities for media providers

use std::time::Duration;

// Health check constants
const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const NOT_CONFIGURED_REASON: &str = "Provider is not configured";

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a media provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Provider is healthy and operational
    Up,
    /// Provider answers but not as expected
    Degraded { reason: String },
    /// Provider is unusable
    Down { reason: String },
}

/// Health check result with timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// The health status
    pub status: HealthStatus,
    /// Response time for the health check
    pub response_time: Duration,
    /// When the health check was performed
    pub timestamp: DateTime<Utc>,
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Upper bound for a single provider health check
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS),
        }
    }
}

impl HealthStatus {
    /// Status reported by providers that lack credentials
    pub fn not_configured() -> Self {
        HealthStatus::Down {
            reason: NOT_CONFIGURED_REASON.to_string(),
        }
    }

    /// Check if this health status indicates the provider is usable
    pub fn is_available(&self) -> bool {
        matches!(self, HealthStatus::Up | HealthStatus::Degraded { .. })
    }

    /// Check if this health status indicates the provider is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            HealthStatus::Up => "Provider is healthy",
            HealthStatus::Degraded { reason } | HealthStatus::Down { reason } => reason,
        }
    }
}

impl HealthCheckResult {
    /// Record a status observed after `response_time`
    pub fn new(status: HealthStatus, response_time: Duration) -> Self {
        Self {
            status,
            response_time,
            timestamp: Utc::now(),
        }
    }

    /// Result for a health check that did not finish in time
    pub fn timed_out(timeout: Duration) -> Self {
        Self::new(
            HealthStatus::Down {
                reason: format!("Health check timed out after {}s", timeout.as_secs()),
            },
            timeout,
        )
    }
}
