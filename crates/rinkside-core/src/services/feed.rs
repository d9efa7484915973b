//! Player feed: posts with optional images, comments and likes.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::storage::{self, POST_IMAGES_BUCKET};
use crate::models::{
    NewPlayerPost, NewPostComment, NewPostLike, Player, PlayerPost, PostComment, PostLike,
};
use crate::store::{insert_one, select_one, ObjectStore, Query, Record, Store};
use crate::validation::ValidationError;

/// Longest post body, in characters
pub const MAX_POST_LENGTH: usize = 500;

/// Longest comment, in characters
pub const MAX_COMMENT_LENGTH: usize = 280;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error("Only the author can delete a post")]
    NotAuthor,
}

/// Image attached to a new post
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A post as shown in the feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub post: PlayerPost,
    pub author_name: String,
    pub like_count: usize,
    pub comment_count: usize,
    pub liked_by_viewer: bool,
}

fn check_text(field: &str, text: &str, max: usize, allow_empty: bool) -> Result<(), ValidationError> {
    let len = text.chars().count();
    if len == 0 && !allow_empty {
        return Err(ValidationError::new(field, "is required"));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be {} characters or fewer", max),
        ));
    }
    Ok(())
}

async fn get_post<S: Store>(store: &S, post_id: Uuid) -> Result<PlayerPost> {
    select_one(store, Query::new().eq("id", post_id))
        .await
        .context("Failed to load post")?
        .ok_or_else(|| FeedError::PostNotFound(post_id).into())
}

/// Newest posts with author names, counts and the viewer's likes
pub async fn load_feed<S: Store>(store: &S, viewer_id: Uuid, limit: usize) -> Result<Vec<FeedItem>> {
    let posts: Vec<PlayerPost> = store
        .select(&Query::new().order_by("created_at", false).limit(limit))
        .await
        .context("Failed to load feed")?;
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let author_ids = super::collect_ids(&posts, |p| p.player_id);
    let authors: Vec<Player> = store
        .select(&Query::new().is_in("id", author_ids))
        .await
        .context("Failed to load post authors")?;
    let likes: Vec<PostLike> = store
        .select(&Query::new().is_in("post_id", post_ids.iter().copied()))
        .await
        .context("Failed to load likes")?;
    let comments: Vec<PostComment> = store
        .select(&Query::new().is_in("post_id", post_ids.iter().copied()))
        .await
        .context("Failed to load comments")?;

    let names: HashMap<Uuid, String> = authors.into_iter().map(|p| (p.id, p.full_name())).collect();
    let mut like_counts: HashMap<Uuid, usize> = HashMap::new();
    for like in &likes {
        *like_counts.entry(like.post_id).or_default() += 1;
    }
    let mut comment_counts: HashMap<Uuid, usize> = HashMap::new();
    for comment in &comments {
        *comment_counts.entry(comment.post_id).or_default() += 1;
    }

    Ok(posts
        .into_iter()
        .map(|post| FeedItem {
            author_name: names
                .get(&post.player_id)
                .cloned()
                .unwrap_or_else(|| "Unknown player".to_string()),
            like_count: like_counts.get(&post.id).copied().unwrap_or(0),
            comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
            liked_by_viewer: likes
                .iter()
                .any(|l| l.post_id == post.id && l.player_id == viewer_id),
            post,
        })
        .collect())
}

/// Publish a post. Text may be empty only when an image is attached.
pub async fn create_post<S: Store + ObjectStore>(
    store: &S,
    player_id: Uuid,
    content: &str,
    image: Option<ImageUpload>,
) -> Result<PlayerPost> {
    let content = content.trim();
    check_text("content", content, MAX_POST_LENGTH, image.is_some())?;

    let (image_path, image_url) = match image {
        Some(image) => {
            storage::check_image(&image.content_type, image.bytes.len())?;
            let path = storage::object_path("posts", player_id, &image.content_type)
                .ok_or_else(|| ValidationError::new("image", "unsupported image type"))?;
            let url = store
                .upload_object(POST_IMAGES_BUCKET, &path, image.bytes, &image.content_type)
                .await?;
            (Some(path), Some(url))
        }
        None => (None, None),
    };

    let new = NewPlayerPost {
        player_id,
        content: content.to_string(),
        image_url,
    };
    let post: PlayerPost = match insert_one(store, &new).await {
        Ok(post) => post,
        Err(e) => {
            if let Some(path) = image_path {
                warn!(path = %path, error = %e, "Post insert failed, removing image");
                if let Err(cleanup) = store.remove_object(POST_IMAGES_BUCKET, &path).await {
                    warn!(path = %path, error = %cleanup, "Failed to remove orphaned image");
                }
            }
            return Err(e.context("Failed to publish post"));
        }
    };
    info!(post_id = %post.id, player_id = %player_id, "Published post");
    Ok(post)
}

pub async fn comments_for_post<S: Store>(store: &S, post_id: Uuid) -> Result<Vec<PostComment>> {
    store
        .select(&Query::new().eq("post_id", post_id).order_by("created_at", true))
        .await
        .context("Failed to load comments")
}

pub async fn add_comment<S: Store>(
    store: &S,
    post_id: Uuid,
    player_id: Uuid,
    content: &str,
) -> Result<PostComment> {
    let content = content.trim();
    check_text("content", content, MAX_COMMENT_LENGTH, false)?;
    get_post(store, post_id).await?;
    let new = NewPostComment {
        post_id,
        player_id,
        content: content.to_string(),
    };
    insert_one(store, &new).await.context("Failed to add comment")
}

/// Like or unlike a post; returns whether the post is now liked
pub async fn toggle_like<S: Store>(store: &S, post_id: Uuid, player_id: Uuid) -> Result<bool> {
    let query = Query::new().eq("post_id", post_id).eq("player_id", player_id);
    let removed = store
        .delete(PostLike::TABLE, &query)
        .await
        .context("Failed to update like")?;
    if removed > 0 {
        return Ok(false);
    }
    get_post(store, post_id).await?;
    let _: PostLike = insert_one(store, &NewPostLike { post_id, player_id })
        .await
        .context("Failed to like post")?;
    Ok(true)
}

/// Delete a post with its comments and likes. Only the author may do this.
pub async fn delete_post<S: Store>(store: &S, post_id: Uuid, requester_id: Uuid) -> Result<()> {
    let post = get_post(store, post_id).await?;
    if post.player_id != requester_id {
        return Err(FeedError::NotAuthor.into());
    }
    let by_post = Query::new().eq("post_id", post_id);
    store.delete(PostComment::TABLE, &by_post).await?;
    store.delete(PostLike::TABLE, &by_post).await?;
    store
        .delete(PlayerPost::TABLE, &Query::new().eq("id", post_id))
        .await
        .context("Failed to delete post")?;
    info!(post_id = %post_id, "Deleted post");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use crate::store::MemoryStore;

    fn feed_error(err: &anyhow::Error) -> Option<&FeedError> {
        err.downcast_ref::<FeedError>()
    }

    #[tokio::test]
    async fn test_post_content_rules() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();

        assert!(create_post(&store, author, "   ", None).await.is_err());
        assert!(create_post(&store, author, &"x".repeat(501), None).await.is_err());
        let post = create_post(&store, author, &"é".repeat(500), None).await.unwrap();
        assert_eq!(post.content.chars().count(), 500);

        let image = ImageUpload {
            bytes: vec![0xff, 0xd8, 0xff],
            content_type: "image/jpeg".to_string(),
        };
        let photo = create_post(&store, author, "", Some(image)).await.unwrap();
        assert!(photo.image_url.unwrap().starts_with("memory://post-images/posts/"));
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_post_removes_uploaded_image() {
        let store = MemoryStore::new();
        store.fail_inserts_into(PlayerPost::TABLE);
        let image = ImageUpload {
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            content_type: "image/png".to_string(),
        };

        let err = create_post(&store, Uuid::new_v4(), "Team photo", Some(image))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to publish post"));
        assert_eq!(store.object_count(), 0);
        assert_eq!(store.count(PlayerPost::TABLE), 0);
    }

    #[tokio::test]
    async fn test_feed_counts_and_likes() {
        let store = MemoryStore::new();
        let coach = Uuid::new_v4();
        let ada = fixtures::player(&store, coach, "Ada", "Ames").await;
        let ben = fixtures::player(&store, coach, "Ben", "Boyd").await;

        let post = create_post(&store, ada.id, "Hat trick tonight", None).await.unwrap();
        assert!(toggle_like(&store, post.id, ben.id).await.unwrap());
        assert!(toggle_like(&store, post.id, ada.id).await.unwrap());
        assert!(!toggle_like(&store, post.id, ada.id).await.unwrap());
        add_comment(&store, post.id, ben.id, "Nice!").await.unwrap();
        assert!(add_comment(&store, post.id, ben.id, &"y".repeat(281)).await.is_err());

        let feed = load_feed(&store, ben.id, 20).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author_name, "Ada Ames");
        assert_eq!(feed[0].like_count, 1);
        assert_eq!(feed[0].comment_count, 1);
        assert!(feed[0].liked_by_viewer);
        assert!(!load_feed(&store, ada.id, 20).await.unwrap()[0].liked_by_viewer);

        let err = toggle_like(&store, Uuid::new_v4(), ben.id).await.unwrap_err();
        assert!(matches!(feed_error(&err), Some(FeedError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_post_author_only() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        let post = create_post(&store, author, "Tournament champs", None).await.unwrap();
        toggle_like(&store, post.id, other).await.unwrap();
        add_comment(&store, post.id, other, "Congrats").await.unwrap();

        let err = delete_post(&store, post.id, other).await.unwrap_err();
        assert_eq!(feed_error(&err), Some(&FeedError::NotAuthor));

        delete_post(&store, post.id, author).await.unwrap();
        assert_eq!(store.count(PlayerPost::TABLE), 0);
        assert_eq!(store.count(PostLike::TABLE), 0);
        assert_eq!(store.count(PostComment::TABLE), 0);
    }
}
