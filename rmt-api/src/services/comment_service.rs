//! Comment Service

use chrono::Utc;
use rmt_core::{Artifact, ArtifactId, Comment, CommentId, EntityIdType, User};
use rmt_storage::{CommentStore, Storage};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::validation::{ValidateMaxLen, ValidateNonEmpty, TEXT_MAX_LEN};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Storage>,
}

impl std::fmt::Debug for CommentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentService").finish_non_exhaustive()
    }
}

impl CommentService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Comments on an artifact, oldest first.
    pub async fn get_comments(&self, artifact_id: ArtifactId) -> ApiResult<Vec<Comment>> {
        Ok(self.store.comment_list(artifact_id).await?)
    }

    /// Attach a comment to `artifact`. Blank text is rejected.
    pub async fn add_comment(&self, artifact: &Artifact, author: &User, text: &str) -> ApiResult<Comment> {
        text.validate_non_empty("text")?;
        let text = text.trim();
        text.validate_max_len("text", TEXT_MAX_LEN)?;

        let comment = Comment {
            comment_id: CommentId::now_v7(),
            artifact_id: artifact.id(),
            author_id: author.user_id,
            author_name: author.name.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.store.comment_insert(&comment).await?;

        tracing::debug!(
            artifact_id = %artifact.id(),
            author = %author.name,
            "Comment added"
        );
        Ok(comment)
    }
}
