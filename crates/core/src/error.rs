use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum ReelnoteError {
    #[error("Not a supported file type: {path}")]
    UnsupportedMediaType { path: PathBuf },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Backend returned {status} for {url}")]
    BackendStatus { url: String, status: u16 },

    #[error("Invalid folder id {folder_id:?}")]
    InvalidFolderId { folder_id: String },

    #[error("Invalid object key {key:?}")]
    InvalidObjectKey { key: String },

    #[error("Folder not found: {folder_id}")]
    FolderNotFound { folder_id: String },

    #[error("Object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("No extracted text in folder {folder_id}")]
    TextNotFound { folder_id: String },

    #[error("Comment {comment_id} not found in folder {folder_id}")]
    CommentNotFound {
        folder_id: String,
        comment_id: String,
    },

    #[error("User {user_id} may not modify comment {comment_id}")]
    Forbidden { user_id: String, comment_id: String },

    #[error("Invalid user id {user_id:?}")]
    InvalidUserId { user_id: String },

    #[error("Sign in required")]
    SignInRequired,

    #[error("No folder selected")]
    NoFolderSelected,

    #[error("Invalid anchor {start}..{end} for text of {len} characters")]
    InvalidAnchor { start: usize, end: usize, len: usize },

    #[error("Invalid comment: {reason}")]
    InvalidComment { reason: String },

    #[error("Summary generation failed: {reason}")]
    SummaryFailed { reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReelnoteError>;
