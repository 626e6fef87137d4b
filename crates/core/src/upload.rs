//! Single-file uploads with optional overwrite

use crate::client::{split_path, DriveClient};
use crate::entry::EntryId;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, Transport};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// Fallback when the MIME type cannot be guessed
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Guess a MIME type from a file extension
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

impl<T: Transport> DriveClient<T> {
    /// Upload `content` as `name` under `parent_id`.
    ///
    /// `name` may carry parent folders (`"docs/2024/report.pdf"`); they are
    /// resolved or created first. With `overwrite`, same-named entries in the
    /// target folder are moved to the trash before the upload. That cleanup is
    /// best-effort: its failures are logged and the upload still happens, which
    /// can leave a duplicate behind.
    pub async fn upload_file<R>(
        &self,
        name: &str,
        mut content: R,
        mime_type: &str,
        parent_id: Option<EntryId>,
        overwrite: bool,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let segments = split_path(name)?;
        let (file_name, folders) = segments
            .split_last()
            .ok_or_else(|| Error::InvalidArgument("file name must not be empty".to_string()))?;
        let file_name = file_name.to_string();

        let mut parent_id = parent_id;
        if !folders.is_empty() {
            let folder_path = folders.join("/");
            parent_id = match self.get_or_create_folder(&folder_path, parent_id).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(folder = %folder_path, error = %err, "unable to resolve upload folder");
                    return Err(err);
                }
            };
        }

        let mut buffer = Vec::new();
        content.read_to_end(&mut buffer).await?;

        if overwrite {
            self.remove_existing(&file_name, parent_id).await;
        }

        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            mime_type.to_string()
        };
        let size = buffer.len();

        self.send(ApiRequest::Upload {
            file_name: file_name.clone(),
            mime_type,
            parent_id,
            content: buffer,
        })
        .await?
        .expect_status(201, "upload")?;

        info!(name = %file_name, parent = ?parent_id, size, "uploaded file");
        Ok(())
    }

    /// Upload a local file, naming it after the last path component and
    /// guessing its MIME type from the extension.
    pub async fn upload_file_from_path(
        &self,
        path: &Path,
        parent_id: Option<EntryId>,
        overwrite: bool,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("cannot derive a file name from {}", path.display()))
            })?;

        let file = File::open(path).await.map_err(|source| Error::LocalPath {
            path: path.to_path_buf(),
            source,
        })?;

        let mime_type = guess_mime_type(path);
        self.upload_file(&file_name, file, &mime_type, parent_id, overwrite)
            .await
    }

    /// Trash every entry called `name` under `parent_id`, logging failures
    async fn remove_existing(&self, name: &str, parent_id: Option<EntryId>) {
        let ids = match self.lookup_entries_by_name(name, parent_id, None).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(name, error = %err, "overwrite lookup failed, uploading anyway");
                return;
            }
        };

        if ids.is_empty() {
            return;
        }

        debug!(name, ?ids, "replacing existing entries");
        if let Err(err) = self.delete_entries(&ids).await {
            warn!(name, ?ids, error = %err, "failed to delete existing entries, uploading anyway");
        }
    }
}
