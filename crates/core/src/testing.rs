//! In-memory drive used by the unit tests
//!
//! `StubTransport` records every request and answers like a small remote service:
//! index queries are substring searches that ignore the parent filter, folders and
//! uploads allocate fresh IDs, deletions remove entries. Responses can be scripted
//! per operation to simulate failures.

use crate::entry::{EntryId, EntryType, IndexEntry};
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct Drive {
    entries: Vec<(IndexEntry, EntryType)>,
    next_id: i64,
}

impl Drive {
    fn insert(&mut self, name: &str, parent_id: Option<EntryId>, entry_type: EntryType) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.push((
            IndexEntry {
                id,
                name: name.to_string(),
                file_name: Some(name.to_string()),
                parent_id,
                path: None,
            },
            entry_type,
        ));
        id
    }
}

#[derive(Default)]
pub(crate) struct StubTransport {
    calls: Mutex<Vec<ApiRequest>>,
    drive: Mutex<Drive>,
    scripted: Mutex<HashMap<&'static str, VecDeque<Result<ApiResponse>>>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder to the simulated drive without recording a call
    pub fn seed_folder(&self, name: &str, parent_id: Option<EntryId>) -> EntryId {
        self.drive.lock().unwrap().insert(name, parent_id, EntryType::Folder)
    }

    /// Add a file to the simulated drive without recording a call
    pub fn seed_file(&self, name: &str, parent_id: Option<EntryId>) -> EntryId {
        self.drive.lock().unwrap().insert(name, parent_id, EntryType::File)
    }

    /// Answer the next `operation` call with `response` instead of simulating it
    pub fn script(&self, operation: &'static str, response: Result<ApiResponse>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls().iter().map(ApiRequest::operation).collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.operations().iter().filter(|op| **op == operation).count()
    }

    /// Names and parents of everything currently stored
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.drive
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    fn simulate(&self, request: &ApiRequest) -> ApiResponse {
        let mut drive = self.drive.lock().unwrap();
        match request {
            ApiRequest::IndexEntries {
                query, entry_type, ..
            } => {
                let data: Vec<&IndexEntry> = drive
                    .entries
                    .iter()
                    .filter(|(entry, kind)| {
                        entry.name.contains(query.as_str())
                            && entry_type.map_or(true, |wanted| wanted == *kind)
                    })
                    .map(|(entry, _)| entry)
                    .collect();
                let body = serde_json::json!({ "data": data });
                ApiResponse::new(200, body.to_string())
            }
            ApiRequest::CreateFolder { name, parent_id } => {
                let id = drive.insert(name, *parent_id, EntryType::Folder);
                let body = serde_json::json!({ "status": "success", "folder": { "id": id } });
                ApiResponse::new(200, body.to_string())
            }
            ApiRequest::Upload {
                file_name,
                parent_id,
                ..
            } => {
                let id = drive.insert(file_name, *parent_id, EntryType::File);
                let body = serde_json::json!({ "status": "success", "fileEntry": { "id": id } });
                ApiResponse::new(201, body.to_string())
            }
            ApiRequest::DeleteEntries { entry_ids, .. } => {
                drive.entries.retain(|(entry, _)| !entry_ids.contains(&entry.id));
                ApiResponse::new(200, "{}")
            }
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(request.clone());

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(request.operation())
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(response) => response,
            None => Ok(self.simulate(&request)),
        }
    }
}

/// Convenience for scripting a transport failure
pub(crate) fn network_down() -> Result<ApiResponse> {
    Err(Error::Network("connection reset by peer".to_string()))
}
