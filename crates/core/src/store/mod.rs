//! Seams to the object store (videos, extracted text) and the document store
//! (summaries, comments, users), with local filesystem adapters.

pub mod documents;
pub mod objects;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::{
    error::Result,
    types::{Comment, FolderId, FolderRecord, ObjectEntry, ObjectMeta, UserRecord},
};

pub use documents::FsDocumentStore;
pub use objects::FsObjectStore;

pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// An object opened for streaming, with the headers a response needs.
pub struct ObjectBody {
    pub meta: ObjectMeta,
    pub body: ByteStream,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object under `prefix`, excluding the prefix itself and directory
    /// markers. Paths in the result are relative to the prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>>;

    /// Top-level folders.
    async fn list_folders(&self) -> Result<Vec<FolderId>>;

    async fn head(&self, key: &str) -> Result<ObjectMeta>;

    async fn get(&self, key: &str) -> Result<Bytes>;

    async fn open(&self, key: &str) -> Result<ObjectBody>;
}

/// Single-item store keyed by folder id. Comment updates are whole-list
/// replaces or appends; there is no per-element transaction and the last
/// writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, folder_id: &FolderId) -> Result<Option<FolderRecord>>;

    /// Create or overwrite the whole record.
    async fn put(&self, record: &FolderRecord) -> Result<()>;

    /// Append to the folder's comment list, creating the record if needed.
    async fn append_comment(&self, comment: &Comment) -> Result<()>;

    /// Replace the folder's comment list. The record must exist.
    async fn replace_comments(&self, folder_id: &FolderId, comments: &[Comment]) -> Result<()>;

    async fn put_user(&self, user: &UserRecord) -> Result<()>;
}
