//! Upload videos for transcription, follow the job, then review the result:
//! the extracted text, an AI summary, and comments anchored to spans of text.

pub mod backend;
pub mod comments;
pub mod config;
pub mod error;
pub mod format;
pub mod media;
pub mod notice;
pub mod paths;
pub mod poller;
pub mod provider;
pub mod review;
pub mod session;
pub mod store;
pub mod summary;
pub mod types;

pub use backend::{HttpJobBackend, JobBackend};
pub use comments::{CommentBoard, NewComment};
pub use config::AppConfig;
pub use error::{ReelnoteError, Result};
pub use format::{format_size, format_summary};
pub use notice::{Notice, NoticeLevel};
pub use paths::{get_documents_dir, get_objects_dir, get_root_data_dir};
pub use poller::{PollEvent, PollHandle, PollOutcome, StatusPoller};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use review::{FolderArtifacts, FolderReview};
pub use session::{ReviewContext, Session};
pub use store::{DocumentStore, FsDocumentStore, FsObjectStore, ObjectBody, ObjectStore};
pub use summary::Summarizer;
pub use types::{
    Comment, FolderId, FolderRecord, Job, JobStatus, ObjectEntry, ObjectMeta, RefText, TaskId,
    UserRecord,
};
