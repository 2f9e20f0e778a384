// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Media pool storage

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    download::Downloader,
    error::{MediaPoolError, MediaPoolResult},
    filename,
};

/// Column holding attribution text
pub const COPYRIGHT_COLUMN: &str = "med_copyright";

/// One file in the media pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MediaRecord {
    /// Row id
    pub id: i64,
    /// Filename inside the media directory
    pub filename: String,
    /// Name the file was imported under
    pub original_name: String,
    /// Display title
    pub title: String,
    /// Media category, `0` for none
    pub category_id: i64,
    /// MIME type
    pub filetype: String,
    /// Size in bytes
    pub filesize: i64,
    /// Attribution text
    pub copyright: Option<String>,
    /// Unix timestamp of the import
    pub created_at: i64,
}

const SELECT_MEDIA: &str = "SELECT id, filename, original_name, title, category_id, filetype, \
                            filesize, med_copyright AS copyright, created_at FROM media";

/// Files on disk plus their rows in the `media` table
#[derive(Debug, Clone)]
pub struct MediaPool {
    db: SqlitePool,
    media_dir: PathBuf,
}

impl MediaPool {
    /// Open the media pool on an already migrated database
    ///
    /// Creates `media_dir` if needed and makes sure the copyright column
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the schema
    /// check fails
    pub async fn new(db: SqlitePool, media_dir: impl Into<PathBuf>) -> MediaPoolResult<Self> {
        let media_dir = media_dir.into();
        tokio::fs::create_dir_all(&media_dir).await?;

        let pool = Self { db, media_dir };
        pool.ensure_copyright_field().await?;
        Ok(pool)
    }

    /// Directory holding the media files
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Underlying database pool
    pub fn database(&self) -> &SqlitePool {
        &self.db
    }

    /// Add the `med_copyright` column when it is missing
    ///
    /// Returns `true` if the column was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be inspected or altered
    pub async fn ensure_copyright_field(&self) -> MediaPoolResult<bool> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pragma_table_info('media') WHERE name = ?",
        )
        .bind(COPYRIGHT_COLUMN)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Ok(false);
        }

        sqlx::query("ALTER TABLE media ADD COLUMN med_copyright TEXT")
            .execute(&self.db)
            .await?;
        info!(column = COPYRIGHT_COLUMN, "Added copyright column to media table");
        Ok(true)
    }

    /// Whether a file with this name is known, either as a row or on disk
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn file_exists(&self, filename: &str) -> MediaPoolResult<bool> {
        let row = sqlx::query_scalar::<_, i64>("SELECT id FROM media WHERE filename = ?")
            .bind(filename)
            .fetch_optional(&self.db)
            .await?;

        if row.is_some() {
            return Ok(true);
        }

        Ok(filename::is_safe(filename)
            && tokio::fs::try_exists(self.media_dir.join(filename)).await?)
    }

    /// Look up a media row
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get(&self, filename: &str) -> MediaPoolResult<Option<MediaRecord>> {
        let record = sqlx::query_as::<_, MediaRecord>(&format!("{SELECT_MEDIA} WHERE filename = ?"))
            .bind(filename)
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    /// List media rows, newest first, optionally limited to one category
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list(&self, category_id: Option<i64>) -> MediaPoolResult<Vec<MediaRecord>> {
        let records = match category_id {
            Some(category) => {
                sqlx::query_as::<_, MediaRecord>(&format!(
                    "{SELECT_MEDIA} WHERE category_id = ? ORDER BY id DESC"
                ))
                .bind(category)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, MediaRecord>(&format!("{SELECT_MEDIA} ORDER BY id DESC"))
                    .fetch_all(&self.db)
                    .await?
            }
        };
        Ok(records)
    }

    /// Store attribution text for a file
    ///
    /// # Errors
    ///
    /// Returns [`MediaPoolError::NotFound`] if no row has this filename
    pub async fn set_copyright(&self, filename: &str, copyright: &str) -> MediaPoolResult<()> {
        let result = sqlx::query("UPDATE media SET med_copyright = ? WHERE filename = ?")
            .bind(copyright)
            .bind(filename)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MediaPoolError::NotFound {
                filename: filename.to_string(),
            });
        }
        debug!(filename, "Stored copyright");
        Ok(())
    }

    /// Move a local file into the media directory and record it
    ///
    /// The file is renamed into place, or copied when the source lives on
    /// another filesystem. The title is the filename without its extension.
    ///
    /// # Errors
    ///
    /// Returns an error for unsafe or taken filenames, filesystem failures
    /// and database failures
    pub async fn add_file(
        &self,
        source: &Path,
        filename: &str,
        category_id: i64,
        filetype: &str,
    ) -> MediaPoolResult<MediaRecord> {
        self.check_available(filename).await?;

        let target = self.media_dir.join(filename);
        move_file(source, &target).await?;

        self.insert_row(&target, filename, category_id, filetype).await
    }

    /// Download `url` and store it as `filename`
    ///
    /// The body is written to a temporary file inside the media directory
    /// and renamed into place once complete. Nothing is left behind on
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns an error for unsafe or taken filenames, failed downloads and
    /// storage failures
    pub async fn import_from_url(
        &self,
        downloader: &Downloader,
        url: &str,
        filename: &str,
        copyright: Option<&str>,
        category_id: i64,
    ) -> MediaPoolResult<MediaRecord> {
        self.check_available(filename).await?;

        let download = downloader.download_to(url, &self.media_dir).await?;
        let filetype = download
            .content_type
            .clone()
            .filter(|t| t != "application/octet-stream")
            .unwrap_or_else(|| filename::mime_for_filename(filename).to_string());

        let target = self.media_dir.join(filename);
        download
            .file
            .persist_noclobber(&target)
            .map_err(|e| {
                if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                    MediaPoolError::FileExists {
                        filename: filename.to_string(),
                    }
                } else {
                    MediaPoolError::Io(e.error)
                }
            })?;

        let mut record = match self.insert_row(&target, filename, category_id, &filetype).await {
            Ok(record) => record,
            Err(error) => {
                if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                    warn!(filename, error = %cleanup, "Failed to remove orphaned media file");
                }
                return Err(error);
            }
        };

        if let Some(text) = copyright.map(str::trim).filter(|c| !c.is_empty()) {
            self.set_copyright(filename, text).await?;
            record.copyright = Some(text.to_string());
        }

        info!(
            filename,
            bytes = record.filesize,
            filetype = %record.filetype,
            "Imported media file"
        );
        Ok(record)
    }

    async fn check_available(&self, filename: &str) -> MediaPoolResult<()> {
        if !filename::is_safe(filename) {
            return Err(MediaPoolError::InvalidFilename {
                filename: filename.to_string(),
            });
        }
        if self.file_exists(filename).await? {
            return Err(MediaPoolError::FileExists {
                filename: filename.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_row(
        &self,
        path: &Path,
        filename: &str,
        category_id: i64,
        filetype: &str,
    ) -> MediaPoolResult<MediaRecord> {
        let filesize = i64::try_from(tokio::fs::metadata(path).await?.len()).unwrap_or(i64::MAX);
        let title = filename::stem(filename).to_string();
        let created_at = Utc::now().timestamp();

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO media (filename, original_name, title, category_id, filetype, filesize, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(filename)
        .bind(filename)
        .bind(&title)
        .bind(category_id)
        .bind(filetype)
        .bind(filesize)
        .bind(created_at)
        .fetch_one(&self.db)
        .await?;

        Ok(MediaRecord {
            id,
            filename: filename.to_string(),
            original_name: filename.to_string(),
            title,
            category_id,
            filetype: filetype.to_string(),
            filesize,
            copyright: None,
            created_at,
        })
    }
}

async fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, target).await {
        Ok(()) => Ok(()),
        Err(error) => {
            debug!(source = %source.display(), %error, "rename failed, copying instead");
            copy_then_remove(source, target).await
        }
    }
}

async fn copy_then_remove(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Err(error) = tokio::fs::copy(source, target).await {
        let _ = tokio::fs::remove_file(target).await;
        return Err(error);
    }
    tokio::fs::remove_file(source).await
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_pool() -> (MediaPool, tempfile::TempDir) {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&db).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let pool = MediaPool::new(db, dir.path().join("media")).await.unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn copyright_field_is_created_once() {
        let (pool, dir) = setup_pool().await;
        sqlx::query("ALTER TABLE media DROP COLUMN med_copyright")
            .execute(pool.database())
            .await
            .unwrap();

        let bare = MediaPool {
            db: pool.database().clone(),
            media_dir: dir.path().to_path_buf(),
        };
        assert!(bare.ensure_copyright_field().await.unwrap());
        assert!(!bare.ensure_copyright_field().await.unwrap());
    }

    #[tokio::test]
    async fn add_file_records_row() {
        let (pool, dir) = setup_pool().await;
        let source = dir.path().join("upload.bin");
        std::fs::write(&source, b"hello").unwrap();

        let record = pool
            .add_file(&source, "sunset.jpg", 3, "image/jpeg")
            .await
            .unwrap();

        assert_eq!(record.title, "sunset");
        assert_eq!(record.filesize, 5);
        assert_eq!(record.category_id, 3);
        assert!(!source.exists());
        assert!(pool.media_dir().join("sunset.jpg").exists());

        let stored = pool.get("sunset.jpg").await.unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(pool.list(Some(3)).await.unwrap().len(), 1);
        assert!(pool.list(Some(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_file_is_rejected() {
        let (pool, dir) = setup_pool().await;
        std::fs::write(pool.media_dir().join("taken.png"), b"x").unwrap();

        assert!(pool.file_exists("taken.png").await.unwrap());

        let source = dir.path().join("new.png");
        std::fs::write(&source, b"y").unwrap();
        let result = pool.add_file(&source, "taken.png", 0, "image/png").await;
        assert!(matches!(result, Err(MediaPoolError::FileExists { .. })));
    }

    #[tokio::test]
    async fn unsafe_filename_is_rejected() {
        let (pool, dir) = setup_pool().await;
        let source = dir.path().join("evil");
        std::fs::write(&source, b"z").unwrap();

        let result = pool.add_file(&source, "../evil.sh", 0, "text/plain").await;
        assert!(matches!(result, Err(MediaPoolError::InvalidFilename { .. })));
    }

    #[tokio::test]
    async fn copyright_for_unknown_file() {
        let (pool, _dir) = setup_pool().await;
        let result = pool.set_copyright("nope.jpg", "Jane").await;
        assert!(matches!(result, Err(MediaPoolError::NotFound { .. })));
    }

    #[tokio::test]
    async fn copy_fallback_moves_contents() {
        let (pool, _dir) = setup_pool().await;
        let elsewhere = tempfile::tempdir().unwrap();
        let source = elsewhere.path().join("upload.bin");
        std::fs::write(&source, b"across devices").unwrap();

        let target = pool.media_dir().join("copied.bin");
        copy_then_remove(&source, &target).await.unwrap();

        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"across devices");
    }

    #[tokio::test]
    async fn failed_copy_keeps_source() {
        let (pool, _dir) = setup_pool().await;
        let elsewhere = tempfile::tempdir().unwrap();
        let source = elsewhere.path().join("upload.bin");
        std::fs::write(&source, b"x").unwrap();

        let target = pool.media_dir().join("missing").join("copied.bin");
        assert!(move_file(&source, &target).await.is_err());
        assert!(source.exists());
    }
}
