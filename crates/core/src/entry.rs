//! Remote entry model and response envelopes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned identifier of a file or folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(EntryId)
    }
}

impl From<i64> for EntryId {
    fn from(id: i64) -> Self {
        EntryId(id)
    }
}

/// Kind of remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Folder,
    File,
}

impl EntryType {
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Folder => "folder",
            EntryType::File => "file",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the remote index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<EntryId>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Index query response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct IndexResponse {
    #[serde(default)]
    pub data: Vec<IndexEntry>,
}

/// Folder creation response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct CreateFolderResponse {
    pub folder: CreatedFolder,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedFolder {
    pub id: EntryId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_response_with_null_parent() {
        let body = r#"{"data":[
            {"id":7,"name":"docs","file_name":"docs","parent_id":null,"path":"7"},
            {"id":9,"name":"a.txt","file_name":"f3c1.txt","parent_id":7,"path":"7/9"}
        ]}"#;

        let resp: IndexResponse = serde_json::from_str(body).unwrap();

        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].parent_id, None);
        assert_eq!(resp.data[1].parent_id, Some(EntryId(7)));
        assert_eq!(resp.data[1].path.as_deref(), Some("7/9"));
    }

    #[test]
    fn test_create_folder_response() {
        let body = r#"{"status":"success","folder":{"id":1234,"name":"sub","type":"folder"}}"#;
        let resp: CreateFolderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.folder.id, EntryId(1234));
    }

    #[test]
    fn test_entry_id_parse() {
        assert_eq!(" 42 ".parse::<EntryId>().unwrap(), EntryId(42));
        assert!("abc".parse::<EntryId>().is_err());
        assert_eq!(EntryId(42).to_string(), "42");
    }

    #[test]
    fn test_entry_type_serialization() {
        assert_eq!(serde_json::to_string(&EntryType::Folder).unwrap(), "\"folder\"");
        assert_eq!(EntryType::File.as_str(), "file");
    }
}
