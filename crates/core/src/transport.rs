//! Authenticated HTTP transport for the drive API
//!
//! Every remote call made by [`DriveClient`](crate::DriveClient) is expressed as an
//! [`ApiRequest`] and handed to a [`Transport`], which answers with the raw status
//! code and body. Interpreting the response is left to the caller.

use crate::entry::{EntryId, EntryType};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default public endpoint
pub const DEFAULT_BASE_URL: &str = "https://na.folderfort.com/api/v1";

/// Required suffix of every base URL
const API_SUFFIX: &str = "/api/v1";

/// Default connect timeout, also the deadline of every non-upload request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single call against the drive API
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// Best-effort text search over the remote index
    IndexEntries {
        query: String,
        parent_ids: Vec<EntryId>,
        entry_type: Option<EntryType>,
    },
    /// Create one folder
    CreateFolder {
        name: String,
        parent_id: Option<EntryId>,
    },
    /// Multipart upload of one file
    Upload {
        file_name: String,
        mime_type: String,
        parent_id: Option<EntryId>,
        content: Vec<u8>,
    },
    /// Batched deletion
    DeleteEntries {
        entry_ids: Vec<EntryId>,
        delete_forever: bool,
    },
}

impl ApiRequest {
    /// Short operation name used in logs and errors
    pub fn operation(&self) -> &'static str {
        match self {
            ApiRequest::IndexEntries { .. } => "index entries",
            ApiRequest::CreateFolder { .. } => "create folder",
            ApiRequest::Upload { .. } => "upload",
            ApiRequest::DeleteEntries { .. } => "delete entries",
        }
    }
}

/// Raw response: status code and body bytes
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON
    pub fn json<T: for<'de> serde::Deserialize<'de>>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Fail with `RemoteRejected` unless the status matches `expected`
    pub fn expect_status(self, expected: u16, operation: &'static str) -> Result<Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(Error::rejected(operation, self.status, &self.body))
        }
    }
}

/// Sends requests to the remote service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<EntryId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEntriesBody {
    entry_ids: Vec<String>,
    delete_forever: bool,
}

/// Check that `base_url` is an HTTPS URL ending in `/api/v1` and strip any trailing slash
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim();
    let normalized = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let host = normalized
        .strip_prefix("https://")
        .and_then(|rest| rest.strip_suffix(API_SUFFIX));

    match host {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(normalized.to_string()),
        _ => Err(Error::InvalidArgument(format!(
            "base URL must look like {}, got '{}'",
            DEFAULT_BASE_URL, base_url
        ))),
    }
}

/// reqwest-backed transport adding `Authorization: Bearer <token>` to every request.
///
/// Uploads are bounded only by the connect timeout and cancellation, so large
/// files on slow links are not cut off mid-body.
pub struct HttpTransport {
    api_token: String,
    base_url: String,
    http_client: Client,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with an explicit connect and request timeout
    pub fn with_timeout(base_url: &str, api_token: String, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let api_token = api_token.trim().to_string();
        if api_token.is_empty() {
            return Err(Error::InvalidArgument("API token must not be empty".to_string()));
        }

        let http_client = Client::builder()
            .user_agent(concat!("folderfort/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            api_token,
            base_url,
            http_client,
            timeout,
            cancel: None,
        })
    }

    /// Abort in-flight and future requests once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Translate an [`ApiRequest`] into an authenticated reqwest request
    fn request(&self, request: ApiRequest) -> Result<RequestBuilder> {
        let deadline = match request {
            ApiRequest::Upload { .. } => None,
            _ => Some(self.timeout),
        };

        let builder = match request {
            ApiRequest::IndexEntries {
                query,
                parent_ids,
                entry_type,
            } => {
                let mut params: Vec<(&str, String)> = vec![("query", query)];
                params.extend(parent_ids.iter().map(|id| ("parentIds", id.to_string())));
                if let Some(entry_type) = entry_type {
                    params.push(("type", entry_type.as_str().to_string()));
                }

                self.http_client
                    .get(self.url("drive/file-entries"))
                    .query(&params)
            }
            ApiRequest::CreateFolder { name, parent_id } => self
                .http_client
                .post(self.url("folders"))
                .json(&CreateFolderBody {
                    name: &name,
                    parent_id,
                }),
            ApiRequest::Upload {
                file_name,
                mime_type,
                parent_id,
                content,
            } => {
                let part = multipart::Part::bytes(content)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|e| {
                        Error::InvalidArgument(format!("invalid MIME type '{}': {}", mime_type, e))
                    })?;

                // parentId must precede the file part
                let mut form = multipart::Form::new();
                if let Some(parent_id) = parent_id {
                    form = form.text("parentId", parent_id.to_string());
                }
                form = form.part("file", part);

                self.http_client.post(self.url("uploads")).multipart(form)
            }
            ApiRequest::DeleteEntries {
                entry_ids,
                delete_forever,
            } => self
                .http_client
                .post(self.url("file-entries"))
                .header("X-HTTP-Method-Override", "DELETE")
                .json(&DeleteEntriesBody {
                    entry_ids: entry_ids.iter().map(|id| id.to_string()).collect(),
                    delete_forever,
                }),
        };

        let builder = match deadline {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        Ok(builder
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Accept", "application/json"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let operation = request.operation();
        let builder = self.request(request)?;

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            Ok::<_, Error>(ApiResponse { status, body })
        };

        let result = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    result = exchange => result,
                }
            }
            None => exchange.await,
        };

        if let Ok(response) = &result {
            tracing::trace!(operation, status = response.status, "response received");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::with_timeout("https://drive.example.com/api/v1/", "secret".to_string(), DEFAULT_TIMEOUT)
            .unwrap()
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://na.folderfort.com/api/v1").unwrap(),
            "https://na.folderfort.com/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://na.folderfort.com/api/v1/").unwrap(),
            "https://na.folderfort.com/api/v1"
        );
        assert_eq!(
            normalize_base_url("https://files.example.com/drive/api/v1").unwrap(),
            "https://files.example.com/drive/api/v1"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_malformed() {
        for url in [
            "http://na.folderfort.com/api/v1",
            "https://na.folderfort.com",
            "https://na.folderfort.com/api/v2",
            "https:///api/v1",
            "",
        ] {
            assert!(
                matches!(normalize_base_url(url), Err(Error::InvalidArgument(_))),
                "accepted {url:?}"
            );
        }
    }

    #[test]
    fn test_new_rejects_empty_token() {
        let result = HttpTransport::with_timeout(DEFAULT_BASE_URL, "  ".to_string(), DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_index_request_carries_filters_and_bearer() {
        let request = transport()
            .request(ApiRequest::IndexEntries {
                query: "my docs".to_string(),
                parent_ids: vec![EntryId(12)],
                entry_type: Some(EntryType::Folder),
            })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/v1/drive/file-entries");
        assert_eq!(
            request.url().query(),
            Some("query=my+docs&parentIds=12&type=folder")
        );
        assert_eq!(request.headers()["Authorization"], "Bearer secret");
        assert_eq!(request.headers()["Accept"], "application/json");
        assert_eq!(request.timeout(), Some(&DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", transport());
        assert!(rendered.contains("drive.example.com"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_create_folder_request_body() {
        let request = transport()
            .request(ApiRequest::CreateFolder {
                name: "sub".to_string(),
                parent_id: None,
            })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/v1/folders");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"name":"sub"}"#);
    }

    #[test]
    fn test_delete_request_uses_method_override() {
        let request = transport()
            .request(ApiRequest::DeleteEntries {
                entry_ids: vec![EntryId(1), EntryId(2)],
                delete_forever: false,
            })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/api/v1/file-entries");
        assert_eq!(request.headers()["X-HTTP-Method-Override"], "DELETE");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"entryIds":["1","2"],"deleteForever":false}"#);
    }

    #[test]
    fn test_upload_request_is_multipart() {
        let request = transport()
            .request(ApiRequest::Upload {
                file_name: "a.txt".to_string(),
                mime_type: "text/plain".to_string(),
                parent_id: Some(EntryId(5)),
                content: b"hello".to_vec(),
            })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/api/v1/uploads");
        assert_eq!(request.timeout(), None);
        let content_type = request.headers()["Content-Type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_upload_request_rejects_bad_mime() {
        let result = transport().request(ApiRequest::Upload {
            file_name: "a.txt".to_string(),
            mime_type: "not a mime".to_string(),
            parent_id: None,
            content: Vec::new(),
        });
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_request() {
        let token = CancellationToken::new();
        token.cancel();
        let transport = transport().with_cancellation(token);

        let result = transport
            .send(ApiRequest::CreateFolder {
                name: "x".to_string(),
                parent_id: None,
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_expect_status() {
        let ok = ApiResponse::new(201, "{}").expect_status(201, "upload");
        assert!(ok.is_ok());

        let err = ApiResponse::new(500, "boom").expect_status(201, "upload");
        assert!(matches!(
            err,
            Err(Error::RemoteRejected { status: 500, ref body, .. }) if body == "boom"
        ));
    }
}
