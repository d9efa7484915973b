use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PlayerPost {
    pub id: Uuid,
    pub player_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for PlayerPost {
    const TABLE: &'static str = "player_posts";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayerPost {
    pub player_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub player_id: Uuid,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for PostComment {
    const TABLE: &'static str = "post_comments";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostComment {
    pub post_id: Uuid,
    pub player_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PostLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub player_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for PostLike {
    const TABLE: &'static str = "post_likes";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostLike {
    pub post_id: Uuid,
    pub player_id: Uuid,
}
