// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Asset Import Server Implementation
//!
//! This crate provides the HTTP server for the asset import service, built
//! with Axum. It searches stock-media providers through a cached registry and
//! imports the chosen assets into the media pool.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`state`]: Shared application state and aggregated health checks
//! - [`server`]: Storage setup, server lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Rate limiting and the direct import switch
//! - [`extractors`]: JSON body extraction with descriptive errors
//! - [`metrics`]: Prometheus counters for searches, cache operations and imports
//! - [`openapi`] and [`docs`]: `OpenAPI` document and Swagger UI
//!
//! # Key Features
//!
//! - **Provider Search**: Pixabay, Pexels, Unsplash and Wikimedia Commons behind one result shape
//! - **Response Cache**: search results are kept in SQLite for a configurable TTL
//! - **Imports**: provider assets and arbitrary URLs land in the media pool with attribution
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with timeouts
//! - **Rate Limiting**: IP-based request limiting with configurable requests per minute

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
