use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{ReelnoteError, Result},
    store::DocumentStore,
    types::{Comment, FolderId, FolderRecord, UserRecord},
};

/// Document store keeping one JSON file per item:
/// `<root>/folders/<folder_id>.json` and `<root>/users/<user_id>.json`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_path(&self, folder_id: &FolderId) -> PathBuf {
        self.root
            .join("folders")
            .join(format!("{}.json", folder_id.as_str()))
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.trim().is_empty()
            && !user_id.starts_with('.')
            && !user_id
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());
        if !valid {
            return Err(ReelnoteError::InvalidUserId {
                user_id: user_id.to_string(),
            });
        }
        Ok(self.root.join("users").join(format!("{user_id}.json")))
    }

    /// Read one folder's record, if present. Shared by the trait methods that
    /// do read-modify-write.
    async fn load_folder(&self, folder_id: &FolderId) -> Result<Option<FolderRecord>> {
        read_json(&self.folder_path(folder_id)).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write through a per-call sibling temp file so readers never see a
/// half-written item; concurrent writers each rename a complete file.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, serde_json::to_string_pretty(value)?).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn get(&self, folder_id: &FolderId) -> Result<Option<FolderRecord>> {
        self.load_folder(folder_id).await
    }

    async fn put(&self, record: &FolderRecord) -> Result<()> {
        write_json(&self.folder_path(&record.folder_id), record).await?;
        debug!(folder_id = %record.folder_id, "folder record written");
        Ok(())
    }

    async fn append_comment(&self, comment: &Comment) -> Result<()> {
        let mut record = self
            .load_folder(&comment.folder_id)
            .await?
            .unwrap_or_else(|| FolderRecord::empty(comment.folder_id.clone()));
        record.comments.push(comment.clone());
        self.put(&record).await
    }

    async fn replace_comments(&self, folder_id: &FolderId, comments: &[Comment]) -> Result<()> {
        let mut record =
            self.load_folder(folder_id)
                .await?
                .ok_or_else(|| ReelnoteError::FolderNotFound {
                    folder_id: folder_id.to_string(),
                })?;
        record.comments = comments.to_vec();
        self.put(&record).await
    }

    async fn put_user(&self, user: &UserRecord) -> Result<()> {
        write_json(&self.user_path(&user.user_id)?, user).await?;
        debug!(user_id = %user.user_id, "user record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_cannot_escape_the_store() {
        let store = FsDocumentStore::new("/data");
        assert!(store.user_path("../x").is_err());
        assert!(store.user_path("a/b").is_err());
        assert!(store.user_path("").is_err());
        assert_eq!(
            store.user_path("user_2abc").unwrap(),
            PathBuf::from("/data/users/user_2abc.json")
        );
    }
}
