use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReelnoteError, Result};

/// Key grouping a video, its extracted text, its summary and its comments in
/// both the object store and the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderId(String);

impl FolderId {
    /// A folder id doubles as a path segment in both stores, so separators and
    /// dot segments are rejected.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed != "."
            && trimmed != ".."
            && !trimmed
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());

        if !valid {
            return Err(ReelnoteError::InvalidFolderId { folder_id: raw });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object-store prefix for everything in this folder.
    pub fn prefix(&self) -> String {
        format!("{}/", self.0)
    }

    pub fn object_key(&self, file_name: &str) -> String {
        format!("{}/{}", self.0, file_name)
    }
}

impl TryFrom<String> for FolderId {
    type Error = ReelnoteError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<FolderId> for String {
    fn from(value: FolderId) -> Self {
        value.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    /// Any intermediate stage; the backend reports free-form labels such as
    /// "Extracted audio" or "Transcribed".
    Processing { stage: String },
    Completed,
    Error { message: String },
}

impl JobStatus {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label {
            "Pending" => JobStatus::Pending,
            "Completed" => JobStatus::Completed,
            "Error" => JobStatus::Error {
                message: String::new(),
            },
            _ if label.starts_with("Error:") => JobStatus::Error {
                message: label["Error:".len()..].trim().to_string(),
            },
            _ => JobStatus::Processing {
                stage: label.to_string(),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing { stage } => stage,
            JobStatus::Completed => "Completed",
            JobStatus::Error { .. } => "Error",
        }
    }
}

/// Snapshot of an external transcription job as last reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub task_id: TaskId,
    pub status: JobStatus,
    /// Always within `0.0..=1.0`.
    pub progress: f64,
    pub folder_id: Option<FolderId>,
}

impl Job {
    pub fn new(task_id: TaskId, status: JobStatus, progress: f64) -> Self {
        Self {
            task_id,
            status,
            progress: if progress.is_finite() {
                progress.clamp(0.0, 1.0)
            } else {
                0.0
            },
            folder_id: None,
        }
    }

    pub fn with_folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn percent(&self) -> f64 {
        self.progress * 100.0
    }
}

/// Snapshot of the text span a comment is anchored to. Offsets are character
/// indices into the extracted text at the time the comment was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefText {
    pub start_index: usize,
    pub end_index: usize,
    pub text: String,
}

impl RefText {
    pub fn from_source(source: &str, start: usize, end: usize) -> Result<Self> {
        let len = source.chars().count();
        if start > end || end > len {
            return Err(ReelnoteError::InvalidAnchor { start, end, len });
        }
        Ok(Self {
            start_index: start,
            end_index: end,
            text: source.chars().skip(start).take(end - start).collect(),
        })
    }

    /// Offsets must be ordered and span exactly the snapshot text.
    pub fn check(&self) -> Result<()> {
        let len = self.text.chars().count();
        if self.start_index > self.end_index || self.end_index - self.start_index != len {
            return Err(ReelnoteError::InvalidAnchor {
                start: self.start_index,
                end: self.end_index,
                len,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub folder_id: FolderId,
    #[serde(rename = "commentId")]
    pub comment_id: String,
    #[serde(
        rename = "commentedBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub commented_by: Option<String>,
    pub text: String,
    pub ref_text: RefText,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited: bool,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Document-store item for one folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(rename = "folderID")]
    pub folder_id: FolderId,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl FolderRecord {
    pub fn empty(folder_id: FolderId) -> Self {
        Self {
            folder_id,
            summary: String::new(),
            comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub email: Option<String>,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    /// Relative to the listed prefix.
    pub path: String,
    pub size: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    pub key: String,
    pub content_type: String,
    pub content_length: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_rejects_path_tricks() {
        for bad in ["", "  ", ".", "..", "a/b", "a\\b", "x\ny"] {
            assert!(FolderId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(FolderId::parse(" f-123 ").unwrap().as_str(), "f-123");
    }

    #[test]
    fn status_labels_map_onto_four_states() {
        assert_eq!(JobStatus::from_label("Pending"), JobStatus::Pending);
        assert_eq!(JobStatus::from_label("Completed"), JobStatus::Completed);
        assert_eq!(
            JobStatus::from_label("Extracted audio"),
            JobStatus::Processing {
                stage: "Extracted audio".into()
            }
        );
        assert_eq!(
            JobStatus::from_label("Error: ffmpeg exited"),
            JobStatus::Error {
                message: "ffmpeg exited".into()
            }
        );
        assert!(JobStatus::from_label("Error").is_terminal());
        assert_eq!(
            JobStatus::from_label("Error correction"),
            JobStatus::Processing {
                stage: "Error correction".into()
            }
        );
        assert!(!JobStatus::from_label("Transcribed").is_terminal());
    }

    #[test]
    fn job_progress_is_clamped() {
        let job = Job::new(TaskId::from("t"), JobStatus::Pending, 1.7);
        assert_eq!(job.progress, 1.0);
        let job = Job::new(TaskId::from("t"), JobStatus::Pending, f64::NAN);
        assert_eq!(job.progress, 0.0);
    }

    #[test]
    fn ref_text_uses_character_offsets() {
        let anchor = RefText::from_source("héllo wörld", 6, 11).unwrap();
        assert_eq!(anchor.text, "wörld");
        assert!(RefText::from_source("abc", 2, 1).is_err());
        assert!(RefText::from_source("abc", 0, 4).is_err());
        assert_eq!(RefText::from_source("abc", 3, 3).unwrap().text, "");
        assert!(RefText::from_source("abcdef", 1, 4).unwrap().check().is_ok());
    }

    #[test]
    fn comment_uses_stored_field_names() {
        let comment = Comment {
            folder_id: FolderId::parse("f1").unwrap(),
            comment_id: "c1".into(),
            commented_by: None,
            text: "nice".into(),
            ref_text: RefText {
                start_index: 0,
                end_index: 4,
                text: "this".into(),
            },
            timestamp: "2024-09-01T10:00:00Z".parse().unwrap(),
            edited: false,
            updated_at: None,
        };
        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value["commentId"], "c1");
        assert_eq!(value["ref_text"]["startIndex"], 0);
        assert_eq!(value["ref_text"]["endIndex"], 4);
        assert!(value.get("commentedBy").is_none());
        assert!(value.get("updatedAt").is_none());
    }
}
