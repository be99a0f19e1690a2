use tracing::{info, warn};

use crate::{
    error::{ReelnoteError, Result},
    format::format_summary,
    media::{TEXT_EXTENSION, VIDEO_EXTENSION},
    session::ReviewContext,
    store::{DocumentStore, ObjectBody, ObjectStore},
    summary::Summarizer,
    types::{FolderId, FolderRecord, ObjectEntry, RefText},
};

/// Everything the object store holds for one folder.
#[derive(Debug, Clone)]
pub struct FolderArtifacts {
    pub folder_id: FolderId,
    pub files: Vec<ObjectEntry>,
    pub video: Option<ObjectEntry>,
    pub text: Option<String>,
}

/// Read side of a processed folder: artifacts, summary, video, and the
/// summary/digest generation that writes back to the document store.
pub struct FolderReview<'a> {
    objects: &'a dyn ObjectStore,
    documents: &'a dyn DocumentStore,
}

impl<'a> FolderReview<'a> {
    pub fn new(objects: &'a dyn ObjectStore, documents: &'a dyn DocumentStore) -> Self {
        Self { objects, documents }
    }

    /// List the folder, pick the first `.mp4` as the video and load the first
    /// `.txt` as the extracted text.
    pub async fn artifacts(&self, ctx: &ReviewContext) -> Result<FolderArtifacts> {
        let folder_id = ctx.folder()?;
        let files = self.objects.list(&folder_id.prefix()).await?;

        let video = files
            .iter()
            .find(|f| f.name.ends_with(VIDEO_EXTENSION))
            .cloned();

        let text = match files.iter().find(|f| f.name.ends_with(TEXT_EXTENSION)) {
            Some(entry) => {
                let bytes = self.objects.get(&folder_id.object_key(&entry.path)).await?;
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            None => None,
        };

        Ok(FolderArtifacts {
            folder_id: folder_id.clone(),
            files,
            video,
            text,
        })
    }

    /// The stored summary converted to display markup. The conversion is
    /// applied here and nowhere else.
    pub async fn summary(&self, ctx: &ReviewContext) -> Result<String> {
        let folder_id = ctx.folder()?;
        let record = self
            .documents
            .get(folder_id)
            .await?
            .ok_or_else(|| ReelnoteError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;
        Ok(format_summary(&record.summary))
    }

    /// Open the folder's video for streaming.
    pub async fn open_video(&self, ctx: &ReviewContext) -> Result<ObjectBody> {
        let artifacts = self.artifacts(ctx).await?;
        let video = artifacts.video.ok_or_else(|| ReelnoteError::ObjectNotFound {
            key: artifacts.folder_id.object_key(&format!("*{VIDEO_EXTENSION}")),
        })?;
        self.objects
            .open(&artifacts.folder_id.object_key(&video.path))
            .await
    }

    /// Snapshot a span of the extracted text for a new comment.
    pub async fn anchor(&self, ctx: &ReviewContext, start: usize, end: usize) -> Result<RefText> {
        let artifacts = self.artifacts(ctx).await?;
        let text = artifacts.text.ok_or_else(|| ReelnoteError::TextNotFound {
            folder_id: artifacts.folder_id.to_string(),
        })?;
        RefText::from_source(&text, start, end)
    }

    /// Summarize the folder's extracted text and store the result. Comments
    /// already on the record are kept.
    pub async fn summarize(&self, ctx: &ReviewContext, summarizer: &Summarizer) -> Result<String> {
        let artifacts = self.artifacts(ctx).await?;
        let folder_id = artifacts.folder_id;
        let Some(text) = artifacts.text else {
            warn!(%folder_id, "no extracted text to summarize");
            return Err(ReelnoteError::TextNotFound {
                folder_id: folder_id.to_string(),
            });
        };

        let summary = summarizer.summarize_transcript(&text).await?;

        let mut record = self
            .documents
            .get(&folder_id)
            .await?
            .unwrap_or_else(|| FolderRecord::empty(folder_id.clone()));
        record.summary = summary.clone();
        self.documents.put(&record).await?;

        info!(%folder_id, chars = summary.len(), "summary stored");
        Ok(summary)
    }

    /// Summarize the folder's comments against its stored summary.
    pub async fn digest_comments(
        &self,
        ctx: &ReviewContext,
        summarizer: &Summarizer,
    ) -> Result<String> {
        let folder_id = ctx.folder()?;
        let record = self
            .documents
            .get(folder_id)
            .await?
            .ok_or_else(|| ReelnoteError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;
        summarizer
            .digest_comments(&record.comments, &record.summary)
            .await
    }
}
