//! Comment layer anchored to spans of a folder's extracted text.
//!
//! Every mutation is a read-modify-write of the folder's whole comment list.
//! Two writers racing on one folder can lose an edit; nothing here detects it.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ReelnoteError, Result},
    session::{ReviewContext, Session},
    store::DocumentStore,
    types::{Comment, FolderId, RefText},
};

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub ref_text: RefText,
}

pub struct CommentBoard<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> CommentBoard<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Comments of a folder in insertion order. A folder without a record has
    /// no comments.
    pub async fn list(&self, folder_id: &FolderId) -> Result<Vec<Comment>> {
        Ok(self
            .store
            .get(folder_id)
            .await?
            .map(|record| record.comments)
            .unwrap_or_default())
    }

    pub async fn add(&self, ctx: &ReviewContext, new: NewComment) -> Result<Comment> {
        let folder_id = ctx.folder()?;
        let text = require_text(&new.text)?;
        new.ref_text.check()?;

        let comment = Comment {
            folder_id: folder_id.clone(),
            comment_id: Uuid::new_v4().to_string(),
            commented_by: ctx.session.user_id().map(str::to_string),
            text,
            ref_text: new.ref_text,
            timestamp: Utc::now(),
            edited: false,
            updated_at: None,
        };

        self.store.append_comment(&comment).await?;
        info!(%folder_id, comment_id = %comment.comment_id, "comment added");
        Ok(comment)
    }

    pub async fn edit(&self, ctx: &ReviewContext, comment_id: &str, text: &str) -> Result<Comment> {
        let folder_id = ctx.folder()?;
        let text = require_text(text)?;
        let mut comments = self.list(folder_id).await?;

        let comment = comments
            .iter_mut()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| comment_not_found(folder_id, comment_id))?;
        authorize(&ctx.session, comment)?;

        comment.text = text;
        comment.edited = true;
        comment.updated_at = Some(Utc::now());
        let edited = comment.clone();

        self.store.replace_comments(folder_id, &comments).await?;
        info!(%folder_id, comment_id, "comment edited");
        Ok(edited)
    }

    /// Remove a comment and return the comments that remain.
    pub async fn delete(&self, ctx: &ReviewContext, comment_id: &str) -> Result<Vec<Comment>> {
        let folder_id = ctx.folder()?;
        let record = self
            .store
            .get(folder_id)
            .await?
            .ok_or_else(|| ReelnoteError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;

        let target = record
            .comments
            .iter()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| comment_not_found(folder_id, comment_id))?;
        authorize(&ctx.session, target)?;

        let remaining: Vec<Comment> = record
            .comments
            .into_iter()
            .filter(|c| c.comment_id != comment_id)
            .collect();

        self.store.replace_comments(folder_id, &remaining).await?;
        info!(%folder_id, comment_id, "comment deleted");
        Ok(remaining)
    }
}

/// Only the author may change a comment; comments made without a signed-in
/// author may be changed by any signed-in user.
fn authorize(session: &Session, comment: &Comment) -> Result<()> {
    let user_id = session.require_user()?;
    match comment.commented_by.as_deref() {
        Some(author) if author != user_id => Err(ReelnoteError::Forbidden {
            user_id: user_id.to_string(),
            comment_id: comment.comment_id.clone(),
        }),
        _ => Ok(()),
    }
}

fn require_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ReelnoteError::InvalidComment {
            reason: "comment text is empty".into(),
        });
    }
    Ok(text.to_string())
}

fn comment_not_found(folder_id: &FolderId, comment_id: &str) -> ReelnoteError {
    ReelnoteError::CommentNotFound {
        folder_id: folder_id.to_string(),
        comment_id: comment_id.to_string(),
    }
}
