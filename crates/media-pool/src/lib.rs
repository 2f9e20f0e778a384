// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed media pool
//!
//! Imported assets land in a directory on disk, with one row per file in the
//! `media` table. Each row can carry attribution text in the `med_copyright`
//! column.
//!
//! # Module Structure
//!
//! - [`pool`]: [`MediaPool`] storage operations and the copyright field
//! - [`download`]: [`Downloader`] that fetches remote files into temporary files
//! - [`filename`]: filename sanitizing and extension helpers
//! - [`error`]: [`MediaPoolError`]

pub mod download;
pub mod error;
pub mod filename;
pub mod pool;

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use download::{Download, Downloader, DownloaderConfig, Probe};
pub use error::{MediaPoolError, MediaPoolResult};
pub use pool::{COPYRIGHT_COLUMN, MediaPool, MediaRecord};

/// Open the SQLite database at `url`, creating the file if needed
///
/// In-memory databases get a single connection that is never recycled, as
/// every SQLite connection would otherwise see its own empty database.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the database cannot be opened
pub async fn connect_database(url: &str) -> MediaPoolResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    Ok(pool)
}

/// Run the media pool migrations
///
/// Creates the `media` table. Other crates keep their own migrations in the
/// same database, hence missing versions are ignored.
///
/// # Errors
///
/// Returns an error if a migration fails to apply
pub async fn run_migrations(pool: &SqlitePool) -> MediaPoolResult<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
