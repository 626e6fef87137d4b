//! Drive client: entry lookup, folder resolution and deletion

use crate::entry::{CreateFolderResponse, EntryId, EntryType, IndexResponse};
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, HttpTransport, Transport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client for the drive API, generic over the transport that carries requests
#[derive(Debug)]
pub struct DriveClient<T = HttpTransport> {
    transport: T,
}

impl DriveClient<HttpTransport> {
    /// Connect to `base_url` (`https://<host>/api/v1`) with a bearer token
    pub fn connect_with_timeout(base_url: &str, api_token: String, timeout: Duration) -> Result<Self> {
        Ok(Self::new(HttpTransport::with_timeout(base_url, api_token, timeout)?))
    }

    /// Abort in-flight and future requests once `token` is cancelled
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self::new(self.transport.with_cancellation(token))
    }
}

impl<T: Transport> DriveClient<T> {
    /// Create a client over any transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> Result<crate::transport::ApiResponse> {
        self.transport.send(request).await
    }

    /// Find entries called exactly `name`, optionally restricted to a type.
    ///
    /// The remote index is a substring search and does not reliably honour its
    /// parent filter, so every candidate is re-checked here: the name must match
    /// exactly and the reported parent must equal `parent_id` (`None` is the root).
    /// No match yields an empty list.
    pub async fn lookup_entries_by_name(
        &self,
        name: &str,
        parent_id: Option<EntryId>,
        entry_type: Option<EntryType>,
    ) -> Result<Vec<EntryId>> {
        let response = self
            .send(ApiRequest::IndexEntries {
                query: name.to_string(),
                parent_ids: parent_id.into_iter().collect(),
                entry_type,
            })
            .await?
            .expect_status(200, "index entries")?;

        let index: IndexResponse = response.json()?;

        let mut matches = Vec::new();
        for entry in index.data {
            if entry.name != name {
                continue;
            }
            if entry.parent_id != parent_id {
                if parent_id.is_some() {
                    warn!(
                        name = %entry.name,
                        id = %entry.id,
                        reported_parent = ?entry.parent_id,
                        requested_parent = ?parent_id,
                        path = ?entry.path,
                        "index ignored parent filter, discarding entry"
                    );
                } else {
                    debug!(name = %entry.name, id = %entry.id, parent = ?entry.parent_id, "skipping non-root entry");
                }
                continue;
            }

            debug!(name = %entry.name, id = %entry.id, parent = ?entry.parent_id, "found matching entry");
            matches.push(entry.id);
        }

        Ok(matches)
    }

    /// Look up a single folder segment under `parent_id`
    pub async fn find_folder(&self, name: &str, parent_id: Option<EntryId>) -> Result<Option<EntryId>> {
        let ids = self
            .lookup_entries_by_name(name, parent_id, Some(EntryType::Folder))
            .await?;
        Ok(ids.first().copied())
    }

    /// Create one folder unconditionally and return its ID
    pub async fn create_folder(&self, name: &str, parent_id: Option<EntryId>) -> Result<EntryId> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("folder name must not be empty".to_string()));
        }
        if name.contains('/') {
            return Err(Error::InvalidArgument(format!(
                "folder name '{}' must be a single path segment",
                name
            )));
        }

        let response = self
            .send(ApiRequest::CreateFolder {
                name: name.to_string(),
                parent_id,
            })
            .await?
            .expect_status(200, "create folder")?;

        let created: CreateFolderResponse = response.json()?;
        info!(name, id = %created.folder.id, parent = ?parent_id, "created folder");

        Ok(created.folder.id)
    }

    /// Return the ID of the folder at `path` under `parent_id`, creating every
    /// missing segment of a `/`-delimited path on the way.
    ///
    /// Segments are resolved left to right, each one using the previous folder as
    /// its parent. An existing folder is never duplicated by a repeated call.
    pub async fn get_or_create_folder(&self, path: &str, parent_id: Option<EntryId>) -> Result<EntryId> {
        let segments = split_path(path)?;

        let mut parent = parent_id;
        for segment in segments {
            parent = Some(self.resolve_segment(segment, parent).await?);
        }

        parent.ok_or_else(|| Error::InvalidArgument("folder path must not be empty".to_string()))
    }

    async fn resolve_segment(&self, name: &str, parent_id: Option<EntryId>) -> Result<EntryId> {
        if let Some(id) = self.find_folder(name, parent_id).await? {
            debug!(name, id = %id, "folder already exists");
            return Ok(id);
        }

        match self.create_folder(name, parent_id).await {
            Ok(id) => Ok(id),
            Err(err @ Error::RemoteRejected { .. }) => {
                // Another writer may have created it between lookup and create
                match self.find_folder(name, parent_id).await {
                    Ok(Some(id)) => {
                        warn!(name, id = %id, "folder appeared after create was rejected, reusing it");
                        Ok(id)
                    }
                    _ => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Move entries to the trash in a single batched request
    pub async fn delete_entries(&self, ids: &[EntryId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        debug!(?ids, "deleting entries");
        self.send(ApiRequest::DeleteEntries {
            entry_ids: ids.to_vec(),
            delete_forever: false,
        })
        .await?
        .expect_status(200, "delete entries")?;

        Ok(())
    }
}

/// Split a `/`-delimited remote path into its segments.
///
/// One leading and one trailing `/` are ignored; empty segments are rejected.
/// Segments are kept verbatim, surrounding whitespace included.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("name must not be empty".to_string()));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidArgument(format!(
            "path '{}' contains an empty segment",
            path
        )));
    }

    Ok(segments)
}
