//! In-memory record store for users, videos and their comments.
//!
//! Everything lives in insertion-ordered vectors; lookups are linear scans.

use std::{collections::HashMap, fmt::Display};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    analyzer::AnalysisResult,
    error::{CatalogError, RecordKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    #[default]
    Plain,
    Creator,
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Plain,
    Creator {
        subscriber_count: u64,
        is_verified: bool,
        /// ids of uploaded videos, in upload order
        videos: Vec<String>,
    },
    Viewer {
        watch_history: Vec<String>,
        favorite_categories: Vec<String>,
    },
}

impl From<UserKind> for Role {
    fn from(kind: UserKind) -> Self {
        match kind {
            UserKind::Plain => Self::Plain,
            UserKind::Creator => Self::Creator {
                subscriber_count: 0,
                is_verified: false,
                videos: Vec::new(),
            },
            UserKind::Viewer => Self::Viewer {
                watch_history: Vec::new(),
                favorite_categories: Vec::new(),
            },
        }
    }
}

impl Role {
    pub const fn kind(&self) -> UserKind {
        match self {
            Self::Plain => UserKind::Plain,
            Self::Creator { .. } => UserKind::Creator,
            Self::Viewer { .. } => UserKind::Viewer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub registered_at: DateTime<Local>,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration_secs: u32,
    pub category: String,
    pub creator_id: String,
    pub view_count: u64,
    pub uploaded_at: DateTime<Local>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    // kept so the comment still reads sensibly once its author is deleted
    pub author_name: String,
    pub likes: u64,
    pub dislikes: u64,
    pub posted_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

#[derive(Debug, Default)]
pub struct Catalog {
    users: Vec<User>,
    videos: Vec<Video>,
    results: HashMap<String, AnalysisResult>,
}

/// Trims `value` and rejects it if nothing is left.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CatalogError::InvalidInput(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Every comment in the catalog, grouped by video.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.videos.iter().flat_map(|video| video.comments.iter())
    }

    pub fn users_of_kind(&self, kind: UserKind) -> impl Iterator<Item = &User> {
        self.users.iter().filter(move |user| user.role.kind() == kind)
    }

    pub fn user(&self, id: &str) -> Result<&User, CatalogError> {
        self.users
            .iter()
            .find(|user| user.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::User, id))
    }

    pub fn user_mut(&mut self, id: &str) -> Result<&mut User, CatalogError> {
        self.users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::User, id))
    }

    pub fn video(&self, id: &str) -> Result<&Video, CatalogError> {
        self.videos
            .iter()
            .find(|video| video.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Video, id))
    }

    pub fn video_mut(&mut self, id: &str) -> Result<&mut Video, CatalogError> {
        self.videos
            .iter_mut()
            .find(|video| video.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Video, id))
    }

    pub fn create_user(
        &mut self,
        id: &str,
        username: &str,
        email: &str,
        kind: UserKind,
    ) -> Result<&User, CatalogError> {
        let id = required("user id", id)?;
        let username = required("username", username)?;
        if self.user(id).is_ok() {
            return Err(CatalogError::duplicate(RecordKind::User, id));
        }

        self.users.push(User {
            id: id.to_string(),
            username: username.to_string(),
            email: email.trim().to_string(),
            registered_at: Local::now(),
            role: kind.into(),
        });
        Ok(&self.users[self.users.len() - 1])
    }

    pub fn create_video(
        &mut self,
        creator_id: &str,
        id: &str,
        title: &str,
        url: &str,
        duration_secs: u32,
        category: &str,
    ) -> Result<&Video, CatalogError> {
        let id = required("video id", id)?;
        let title = required("title", title)?;
        if self.video(id).is_ok() {
            return Err(CatalogError::duplicate(RecordKind::Video, id));
        }

        let creator = self.user_mut(creator_id)?;
        let Role::Creator { videos, .. } = &mut creator.role else {
            return Err(CatalogError::InvalidInput(format!(
                "user {creator_id} is not a video creator"
            )));
        };
        videos.push(id.to_string());

        self.videos.push(Video {
            id: id.to_string(),
            title: title.to_string(),
            url: url.trim().to_string(),
            duration_secs,
            category: category.trim().to_string(),
            creator_id: creator_id.to_string(),
            view_count: 0,
            uploaded_at: Local::now(),
            comments: Vec::new(),
        });
        Ok(&self.videos[self.videos.len() - 1])
    }

    pub fn add_comment(
        &mut self,
        video_id: &str,
        author_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<&Comment, CatalogError> {
        let comment_id = required("comment id", comment_id)?;
        let author_name = self.user(author_id)?.username.clone();
        let video = self.video_mut(video_id)?;
        if video.comments.iter().any(|c| c.id == comment_id) {
            return Err(CatalogError::duplicate(RecordKind::Comment, comment_id));
        }

        video.comments.push(Comment {
            id: comment_id.to_string(),
            content: content.to_string(),
            author_id: author_id.to_string(),
            author_name,
            likes: 0,
            dislikes: 0,
            posted_at: Local::now(),
        });
        Ok(&video.comments[video.comments.len() - 1])
    }

    /// Puts back a fully built video, as read from a snapshot.
    ///
    /// Unlike `create_video`/`add_comment`, the creator and comment authors may be gone:
    /// deleting a user keeps their videos and comments, so snapshots can refer to them. A
    /// missing author is only accepted when the comment carries the author's name.
    pub fn restore_video(&mut self, mut video: Video) -> Result<&Video, CatalogError> {
        required("video id", &video.id)?;
        required("title", &video.title)?;
        if self.video(&video.id).is_ok() {
            return Err(CatalogError::duplicate(RecordKind::Video, &video.id));
        }

        for (i, comment) in video.comments.iter().enumerate() {
            required("comment id", &comment.id)?;
            if video.comments[..i].iter().any(|c| c.id == comment.id) {
                return Err(CatalogError::duplicate(RecordKind::Comment, &comment.id));
            }
        }
        for comment in &mut video.comments {
            match self.user(&comment.author_id) {
                Ok(author) => comment.author_name = author.username.clone(),
                Err(e) if comment.author_name.trim().is_empty() => return Err(e),
                Err(_) => {}
            }
        }

        match self.user_mut(&video.creator_id) {
            Ok(User {
                role: Role::Creator { videos, .. },
                ..
            }) => videos.push(video.id.clone()),
            Ok(_) => {
                return Err(CatalogError::InvalidInput(format!(
                    "user {} is not a video creator",
                    video.creator_id
                )))
            }
            Err(_) => tracing::debug!(
                video = %video.id,
                creator = %video.creator_id,
                "restoring video of a deleted creator"
            ),
        }

        self.videos.push(video);
        Ok(&self.videos[self.videos.len() - 1])
    }

    /// Changes a user's username and/or email. Comments by the user show the new name.
    pub fn update_user(
        &mut self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<&User, CatalogError> {
        let username = username.map(|name| required("username", name)).transpose()?;

        let user = self.user_mut(id)?;
        if let Some(email) = email {
            user.email = email.trim().to_string();
        }
        if let Some(username) = username {
            user.username = username.to_string();
            for video in &mut self.videos {
                for comment in video.comments.iter_mut().filter(|c| c.author_id == id) {
                    comment.author_name = username.to_string();
                }
            }
        }

        self.user(id)
    }

    pub fn watch_video(&mut self, viewer_id: &str, video_id: &str) -> Result<(), CatalogError> {
        // look the video up first so a failed watch leaves the history untouched
        self.video(video_id)?;

        let viewer = self.user_mut(viewer_id)?;
        let Role::Viewer { watch_history, .. } = &mut viewer.role else {
            return Err(CatalogError::InvalidInput(format!(
                "user {viewer_id} is not a viewer"
            )));
        };
        watch_history.push(video_id.to_string());

        self.video_mut(video_id)?.view_count += 1;
        Ok(())
    }

    pub fn react(
        &mut self,
        video_id: &str,
        comment_id: &str,
        reaction: Reaction,
    ) -> Result<&Comment, CatalogError> {
        let comment = self
            .video_mut(video_id)?
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Comment, comment_id))?;

        match reaction {
            Reaction::Like => comment.likes += 1,
            Reaction::Dislike => comment.dislikes += 1,
        }
        Ok(&*comment)
    }

    /// Removes the user. Their videos and comments stay in the catalog.
    pub fn delete_user(&mut self, id: &str) -> Result<User, CatalogError> {
        let index = self
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::User, id))?;
        Ok(self.users.remove(index))
    }

    /// Removes the video together with its comments and any stored result.
    pub fn delete_video(&mut self, id: &str) -> Result<Video, CatalogError> {
        let index = self
            .videos
            .iter()
            .position(|video| video.id == id)
            .ok_or_else(|| CatalogError::not_found(RecordKind::Video, id))?;
        let video = self.videos.remove(index);

        if let Ok(User {
            role: Role::Creator { videos, .. },
            ..
        }) = self.user_mut(&video.creator_id)
        {
            videos.retain(|v| v != id);
        }
        self.results.remove(id);

        Ok(video)
    }

    pub fn record_result(
        &mut self,
        video_id: &str,
        result: AnalysisResult,
    ) -> Result<&AnalysisResult, CatalogError> {
        self.video(video_id)?;
        self.results.insert(video_id.to_string(), result);
        Ok(&self.results[video_id])
    }

    pub fn result(&self, video_id: &str) -> Option<&AnalysisResult> {
        self.results.get(video_id)
    }
}

impl Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "User ID: {}", self.id)?;
        writeln!(f, "Username: {}", self.username)?;
        writeln!(f, "Email: {}", self.email)?;
        write!(
            f,
            "Registration Date: {}",
            self.registered_at.format("%Y-%m-%d")
        )?;

        match &self.role {
            Role::Plain => Ok(()),
            Role::Creator {
                subscriber_count,
                is_verified,
                videos,
            } => {
                writeln!(f)?;
                writeln!(f, "Subscribers: {subscriber_count}")?;
                writeln!(f, "Total Videos: {}", videos.len())?;
                write!(f, "Verified: {is_verified}")
            }
            Role::Viewer {
                watch_history,
                favorite_categories,
            } => {
                writeln!(f)?;
                writeln!(f, "Videos Watched: {}", watch_history.len())?;
                write!(f, "Favorite Categories: {}", favorite_categories.join(", "))
            }
        }
    }
}

impl Display for Video {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "--- Video Information ---")?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Duration: {} seconds", self.duration_secs)?;
        writeln!(f, "Views: {}", self.view_count)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Uploaded: {}", self.uploaded_at.format("%Y-%m-%d"))?;
        write!(f, "Comments: {}", self.comments.len())
    }
}

impl Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Comment by {}: {}", self.author_name, self.content)?;
        writeln!(f, "Likes: {}, Dislikes: {}", self.likes, self.dislikes)?;
        write!(f, "Posted: {}", self.posted_at.format("%Y-%m-%d %H:%M"))
    }
}
