//! Module responsible for collecting and parsing catalog snapshots (json), and writing them back out.

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::catalog::{Catalog, Comment, Role, UserKind, Video};

pub const SNAPSHOT_FILE_NAME: &str = "catalog.json";

pub struct CatalogDirectory {
    path: PathBuf,
    snapshot_file_paths: Vec<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub kind: UserKind,
    #[serde(default)]
    pub subscriber_count: u64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
    #[serde(default)]
    pub watch_history: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration_secs: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub author_id: String,
    // lets the comment survive its author being deleted before the export
    #[serde(default)]
    pub author_name: String,
    // comments without text (e.g. stickers) still count towards the total
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
}

impl TryFrom<PathBuf> for CatalogDirectory {
    type Error = std::io::Error;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path is not a directory",
            ));
        }

        let snapshot_file_paths = WalkDir::new(&path)
            .sort_by_file_name()
            .into_iter()
            // unreadable entries are skipped rather than failing the whole import
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| {
                path.extension()
                    .and_then(std::ffi::OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect::<Vec<_>>();

        if snapshot_file_paths.is_empty() {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Directory does not contain catalog snapshots",
            ))
        } else {
            Ok(Self {
                path,
                snapshot_file_paths,
            })
        }
    }
}

impl CatalogDirectory {
    pub fn snapshot_file_paths(&self) -> &[PathBuf] {
        &self.snapshot_file_paths
    }

    pub fn parse(&self) -> Result<CatalogSnapshot> {
        let snapshots = self
            .snapshot_file_paths
            .iter()
            .map(|path| {
                let reader = BufReader::new(File::open(path)?);
                let snapshot: CatalogSnapshot = serde_json::from_reader(reader)
                    .with_context(|| format!("malformed snapshot {}", path.display()))?;
                Ok(snapshot)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            dir = %self.path.display(),
            files = snapshots.len(),
            "parsed catalog snapshots"
        );
        Ok(CatalogSnapshot::merge(snapshots))
    }
}

impl CatalogSnapshot {
    fn merge(snapshots: Vec<Self>) -> Self {
        snapshots
            .into_iter()
            .fold(Self::default(), |mut merged, snapshot| {
                merged.users.extend(snapshot.users);
                merged.videos.extend(snapshot.videos);
                merged
            })
    }
}

impl Catalog {
    /// Rebuilds a catalog from a snapshot. Users go first since videos and comments refer to
    /// them; they pass the same checks as records typed into the menu. Videos and comments
    /// may refer to users deleted before the export.
    ///
    /// Analysis results are not part of a snapshot; re-run the analysis after importing.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        let mut catalog = Self::new();

        for record in snapshot.users {
            let user = catalog
                .create_user(&record.id, &record.username, &record.email, record.kind)
                .map(|user| user.id.clone())
                .with_context(|| format!("importing user {}", record.id))?;

            match &mut catalog.user_mut(&user)?.role {
                Role::Creator {
                    subscriber_count,
                    is_verified,
                    ..
                } => {
                    *subscriber_count = record.subscriber_count;
                    *is_verified = record.is_verified;
                }
                Role::Viewer {
                    favorite_categories,
                    watch_history,
                } => {
                    *favorite_categories = record.favorite_categories;
                    *watch_history = record.watch_history;
                }
                Role::Plain => {}
            }
        }

        let imported_at = Local::now();
        for record in snapshot.videos {
            let comments = record
                .comments
                .into_iter()
                .map(|comment| Comment {
                    id: comment.id,
                    content: comment.content,
                    author_id: comment.author_id,
                    author_name: comment.author_name,
                    likes: comment.likes,
                    dislikes: comment.dislikes,
                    posted_at: imported_at,
                })
                .collect();

            catalog
                .restore_video(Video {
                    id: record.id.clone(),
                    title: record.title,
                    url: record.url,
                    duration_secs: record.duration_secs,
                    category: record.category,
                    creator_id: record.creator_id,
                    view_count: record.view_count,
                    uploaded_at: imported_at,
                    comments,
                })
                .with_context(|| format!("importing video {}", record.id))?;
        }

        Ok(catalog)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let users = self
            .users()
            .iter()
            .map(|user| {
                let mut record = UserRecord {
                    id: user.id.clone(),
                    username: user.username.clone(),
                    email: user.email.clone(),
                    kind: user.role.kind(),
                    subscriber_count: 0,
                    is_verified: false,
                    favorite_categories: Vec::new(),
                    watch_history: Vec::new(),
                };
                match &user.role {
                    Role::Creator {
                        subscriber_count,
                        is_verified,
                        ..
                    } => {
                        record.subscriber_count = *subscriber_count;
                        record.is_verified = *is_verified;
                    }
                    Role::Viewer {
                        favorite_categories,
                        watch_history,
                    } => {
                        record.favorite_categories = favorite_categories.clone();
                        record.watch_history = watch_history.clone();
                    }
                    Role::Plain => {}
                }
                record
            })
            .collect();

        let videos = self
            .videos()
            .iter()
            .map(|video| VideoRecord {
                id: video.id.clone(),
                creator_id: video.creator_id.clone(),
                title: video.title.clone(),
                url: video.url.clone(),
                duration_secs: video.duration_secs,
                category: video.category.clone(),
                view_count: video.view_count,
                comments: video
                    .comments
                    .iter()
                    .map(|comment| CommentRecord {
                        id: comment.id.clone(),
                        author_id: comment.author_id.clone(),
                        author_name: comment.author_name.clone(),
                        content: comment.content.clone(),
                        likes: comment.likes,
                        dislikes: comment.dislikes,
                    })
                    .collect(),
            })
            .collect();

        CatalogSnapshot { users, videos }
    }
}

/// Writes the catalog as `catalog.json` into `dir`, creating it if needed.
pub fn export_snapshot(catalog: &Catalog, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SNAPSHOT_FILE_NAME);
    fs::write(&path, serde_json::to_string_pretty(&catalog.snapshot())?)?;

    tracing::info!(path = %path.display(), "catalog exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "users": [
            { "id": "u1", "username": "alice", "email": "alice@example.com", "kind": "creator", "subscriber_count": 42 },
            { "id": "u2", "username": "bob", "kind": "viewer", "favorite_categories": ["Education"] }
        ],
        "videos": [
            {
                "id": "v1", "creator_id": "u1", "title": "Demo Video", "duration_secs": 120, "view_count": 7,
                "comments": [
                    { "id": "c1", "author_id": "u2", "content": "This is great, I love it!", "likes": 3 },
                    { "id": "c2", "author_id": "u2", "content": "Not bad but could be better", "dislikes": 1 }
                ]
            }
        ]
    }"#;

    #[test]
    fn rejects_files_and_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "nothing here").unwrap();

        let err = CatalogDirectory::try_from(dir.path().to_path_buf()).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

        let err = CatalogDirectory::try_from(dir.path().join("notes.txt")).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn walks_nested_directories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested").join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("readme.md"), "").unwrap();

        let directory = CatalogDirectory::try_from(dir.path().to_path_buf()).unwrap();
        assert_eq!(directory.snapshot_file_paths().len(), 2);
    }

    #[test]
    fn imports_records_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("catalog.json"), SNAPSHOT).unwrap();

        let snapshot = CatalogDirectory::try_from(dir.path().to_path_buf())
            .unwrap()
            .parse()
            .unwrap();
        let catalog = Catalog::from_snapshot(snapshot).unwrap();

        assert_eq!(catalog.users().len(), 2);
        let video = catalog.video("v1").unwrap();
        assert_eq!(video.view_count, 7);
        assert_eq!(video.comments.len(), 2);
        assert_eq!((video.comments[0].likes, video.comments[1].dislikes), (3, 1));
        assert_eq!(video.comments[0].author_name, "bob");
        assert!(matches!(
            catalog.user("u1").unwrap().role,
            Role::Creator {
                subscriber_count: 42,
                ..
            }
        ));
    }

    #[test]
    fn merges_users_before_videos_across_files() {
        let dir = tempfile::tempdir().unwrap();
        // the video file sorts first, but refers to a user defined in the second file
        fs::write(
            dir.path().join("a_videos.json"),
            r#"{ "videos": [ { "id": "v1", "creator_id": "u1", "title": "Hello" } ] }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b_users.json"),
            r#"{ "users": [ { "id": "u1", "username": "alice", "kind": "creator" } ] }"#,
        )
        .unwrap();

        let snapshot = CatalogDirectory::try_from(dir.path().to_path_buf())
            .unwrap()
            .parse()
            .unwrap();
        let catalog = Catalog::from_snapshot(snapshot).unwrap();
        assert_eq!(catalog.video("v1").unwrap().creator_id, "u1");
    }

    #[test]
    fn invalid_records_fail_the_import() {
        let snapshot: CatalogSnapshot = serde_json::from_str(
            r#"{ "users": [ { "id": "u1", "username": "bob", "kind": "viewer" } ],
                 "videos": [ { "id": "v1", "creator_id": "u1", "title": "Hello" } ] }"#,
        )
        .unwrap();
        let err = Catalog::from_snapshot(snapshot).err().unwrap();
        assert!(err.to_string().contains("importing video v1"));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let err = CatalogDirectory::try_from(dir.path().to_path_buf())
            .unwrap()
            .parse()
            .err()
            .unwrap();
        assert!(err.to_string().contains("broken.json"));
    }

    fn reimport(dir: &Path) -> Result<Catalog> {
        Catalog::from_snapshot(CatalogDirectory::try_from(dir.to_path_buf())?.parse()?)
    }

    #[test]
    fn export_can_be_imported_again() {
        let mut exported =
            Catalog::from_snapshot(serde_json::from_str(SNAPSHOT).unwrap()).unwrap();
        exported.watch_video("u2", "v1").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = export_snapshot(&exported, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), SNAPSHOT_FILE_NAME);

        let reloaded = reimport(dir.path()).unwrap();
        assert_eq!(reloaded.users().len(), exported.users().len());
        assert_eq!(reloaded.comments().count(), 2);
        assert_eq!(reloaded.video("v1").unwrap().view_count, 8);

        let Role::Viewer {
            watch_history,
            favorite_categories,
        } = &reloaded.user("u2").unwrap().role
        else {
            panic!("u2 should be a viewer");
        };
        assert_eq!(watch_history, &vec!["v1".to_string()]);
        assert_eq!(favorite_categories, &vec!["Education".to_string()]);
    }

    #[test]
    fn export_survives_deleted_users() {
        let mut catalog = Catalog::new();
        catalog
            .create_user("u1", "alice", "", UserKind::Creator)
            .unwrap();
        catalog.create_user("u2", "bob", "", UserKind::Viewer).unwrap();
        catalog
            .create_video("u1", "v1", "Demo Video", "", 120, "")
            .unwrap();
        catalog
            .add_comment("v1", "u2", "c1", "This is great, I love it!")
            .unwrap();
        catalog.delete_user("u2").unwrap();
        catalog.delete_user("u1").unwrap();

        let dir = tempfile::tempdir().unwrap();
        export_snapshot(&catalog, dir.path()).unwrap();
        let reloaded = reimport(dir.path()).unwrap();

        assert!(reloaded.users().is_empty());
        let video = reloaded.video("v1").unwrap();
        assert_eq!(video.creator_id, "u1");
        assert_eq!(video.comments[0].author_id, "u2");
        assert_eq!(video.comments[0].author_name, "bob");
    }

    #[test]
    fn unknown_author_needs_a_name() {
        let snapshot: CatalogSnapshot = serde_json::from_str(
            r#"{ "videos": [ { "id": "v1", "creator_id": "u1", "title": "Hello",
                 "comments": [ { "id": "c1", "author_id": "ghost", "content": "hi" } ] } ] }"#,
        )
        .unwrap();
        let err = Catalog::from_snapshot(snapshot).err().unwrap();
        assert!(format!("{err:#}").contains("User not found: ghost"));
    }
}
