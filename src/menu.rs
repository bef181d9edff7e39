//! The interactive text menu. Reads choices line by line and drives the catalog and the analyzer.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::Result;

use crate::{
    analyzer::QualityAnalyzer,
    catalog::{Catalog, Reaction, UserKind},
    error::{CatalogError, InputClosed},
    parser, plotter,
};

const RULE_WIDTH: usize = 60;

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<R, W> {
    catalog: Catalog,
    analyzer: QualityAnalyzer,
    output_dir: PathBuf,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(catalog: Catalog, output_dir: PathBuf, input: R, output: W) -> Self {
        Self {
            catalog,
            analyzer: QualityAnalyzer::default(),
            output_dir,
            input,
            output,
        }
    }

    /// Runs until the user picks exit or the input runs dry.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to Video Analyzer System!")?;

        loop {
            self.display_menu()?;
            let outcome = self
                .prompt("\nEnter your choice: ")
                .and_then(|choice| self.dispatch(&choice));

            match outcome {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    writeln!(self.output, "\nThank you for using Video Analyzer System!")?;
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                Err(e) if e.is::<InputClosed>() => return Ok(()),
                Err(e) => self.report(&e)?,
            }

            match self.prompt("\nPress Enter to continue...") {
                Err(e) if e.is::<InputClosed>() => return Ok(()),
                other => {
                    other?;
                }
            }
        }
    }

    fn display_menu(&mut self) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output, "\n{rule}")?;
        writeln!(self.output, "VIDEO ANALYZER SYSTEM")?;
        writeln!(self.output, "{rule}")?;
        for line in [
            "1. Create User/Creator/Viewer",
            "2. Create Video",
            "3. Create Comment",
            "4. Analyze Video",
            "5. List All Users",
            "6. List All Videos",
            "7. List All Comments",
            "8. Search User by ID",
            "9. Search Video by ID",
            "10. Delete User",
            "11. Delete Video",
            "12. Display Video Details",
            "13. Watch Video",
            "14. Like/Dislike Comment",
            "15. Save Analysis Result",
            "16. Export Catalog",
            "17. Plot Video Sentiment",
            "18. Update User",
            "0. Exit",
        ] {
            writeln!(self.output, "{line}")?;
        }
        writeln!(self.output, "{rule}")?;
        Ok(())
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        match choice {
            "1" => self.create_user()?,
            "2" => self.create_video()?,
            "3" => self.create_comment()?,
            "4" => self.analyze_video()?,
            "5" => self.list_users()?,
            "6" => self.list_videos()?,
            "7" => self.list_comments()?,
            "8" => self.search_user()?,
            "9" => self.search_video()?,
            "10" => self.delete_user()?,
            "11" => self.delete_video()?,
            "12" => self.display_video_details()?,
            "13" => self.watch_video()?,
            "14" => self.react_to_comment()?,
            "15" => self.save_result()?,
            "16" => self.export_catalog()?,
            "17" => self.plot_video()?,
            "18" => self.update_user()?,
            "0" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "\nInvalid choice! Please try again.")?,
        }
        Ok(Flow::Continue)
    }

    /// Store errors are expected (typos, unknown ids); anything else is shown as a plain error.
    fn report(&mut self, error: &anyhow::Error) -> Result<()> {
        if let Some(catalog_error) = error.downcast_ref::<CatalogError>() {
            tracing::warn!(%catalog_error, "menu operation rejected");
            writeln!(self.output, "\n{catalog_error}")?;
        } else {
            tracing::warn!(error = %format!("{error:#}"), "menu operation failed");
            writeln!(self.output, "\nError: {error:#}")?;
        }
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim().to_string())
    }

    fn rule(&mut self, title: &str) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output, "\n{rule}\n{title}\n{rule}")?;
        Ok(())
    }

    fn list_video_choices(&mut self, with_comment_counts: bool) -> Result<()> {
        writeln!(self.output, "\nAvailable videos:")?;
        for video in self.catalog.videos() {
            if with_comment_counts {
                writeln!(
                    self.output,
                    "  {}: {} ({} comments)",
                    video.id,
                    video.title,
                    video.comments.len()
                )?;
            } else {
                writeln!(self.output, "  {}: {}", video.id, video.title)?;
            }
        }
        Ok(())
    }

    fn create_user(&mut self) -> Result<()> {
        writeln!(self.output, "\nSelect user type:")?;
        writeln!(self.output, "1. Regular User")?;
        writeln!(self.output, "2. Video Creator")?;
        writeln!(self.output, "3. Viewer")?;
        let (kind, label) = match self.prompt("Choice: ")?.as_str() {
            "1" => (UserKind::Plain, "User"),
            "2" => (UserKind::Creator, "Video Creator"),
            "3" => (UserKind::Viewer, "Viewer"),
            _ => {
                writeln!(self.output, "Invalid choice!")?;
                return Ok(());
            }
        };

        let id = self.prompt("Enter User ID: ")?;
        let username = self.prompt("Enter Username: ")?;
        let email = self.prompt("Enter Email: ")?;

        let user = self.catalog.create_user(&id, &username, &email, kind)?;
        writeln!(
            self.output,
            "\n{label} {} created successfully!",
            user.username
        )?;
        Ok(())
    }

    fn create_video(&mut self) -> Result<()> {
        if self.catalog.users_of_kind(UserKind::Creator).next().is_none() {
            writeln!(
                self.output,
                "\nNo video creators available. Create a creator first!"
            )?;
            return Ok(());
        }

        writeln!(self.output, "\nAvailable creators:")?;
        for creator in self.catalog.users_of_kind(UserKind::Creator) {
            writeln!(self.output, "  {}: {}", creator.id, creator.username)?;
        }

        let creator_id = self.prompt("\nEnter Creator ID: ")?;
        self.catalog.user(&creator_id)?;
        let id = self.prompt("Enter Video ID: ")?;
        let title = self.prompt("Enter Title: ")?;
        let url = self.prompt("Enter URL: ")?;
        let duration = self.prompt("Enter Duration (seconds): ")?;
        let duration_secs = duration.parse::<u32>().map_err(|_| {
            CatalogError::InvalidInput(format!(
                "duration must be a whole number of seconds, got {duration:?}"
            ))
        })?;
        let category = self.prompt("Enter Category: ")?;

        let video = self
            .catalog
            .create_video(&creator_id, &id, &title, &url, duration_secs, &category)?;
        writeln!(self.output, "\nVideo '{}' created successfully!", video.title)?;
        Ok(())
    }

    fn create_comment(&mut self) -> Result<()> {
        if self.catalog.videos().is_empty() {
            writeln!(self.output, "\nNo videos available. Create a video first!")?;
            return Ok(());
        }
        if self.catalog.users().is_empty() {
            writeln!(self.output, "\nNo users available. Create a user first!")?;
            return Ok(());
        }

        self.list_video_choices(false)?;
        let video_id = self.prompt("\nEnter Video ID: ")?;
        self.catalog.video(&video_id)?;

        writeln!(self.output, "\nAvailable users:")?;
        for user in self.catalog.users() {
            writeln!(self.output, "  {}: {}", user.id, user.username)?;
        }
        let author_id = self.prompt("\nEnter User ID (author): ")?;
        self.catalog.user(&author_id)?;

        let comment_id = self.prompt("Enter Comment ID: ")?;
        let content = self.prompt("Enter Comment Content: ")?;

        self.catalog
            .add_comment(&video_id, &author_id, &comment_id, &content)?;
        writeln!(self.output, "\nComment added successfully!")?;
        Ok(())
    }

    fn analyze_video(&mut self) -> Result<()> {
        if self.catalog.videos().is_empty() {
            writeln!(self.output, "\nNo videos available!")?;
            return Ok(());
        }

        self.list_video_choices(true)?;
        let video_id = self.prompt("\nEnter Video ID to analyze: ")?;
        let video = self.catalog.video(&video_id)?;
        if video.comments.is_empty() {
            writeln!(self.output, "\nThis video has no comments to analyze!")?;
            return Ok(());
        }

        writeln!(
            self.output,
            "\nAnalyzing {} comments...",
            video.comments.len()
        )?;
        let result = self.analyzer.analyze(&video.comments);
        writeln!(self.output, "\n{result}\n")?;

        tracing::info!(
            video = %video_id,
            result = result.result_id(),
            analyzed_at = %result.analyzed_at(),
            "storing analysis result"
        );
        self.catalog.record_result(&video_id, result)?;
        Ok(())
    }

    fn list_users(&mut self) -> Result<()> {
        if self.catalog.users().is_empty() {
            writeln!(self.output, "\nNo users in the system.")?;
            return Ok(());
        }

        self.rule("ALL USERS")?;
        for user in self.catalog.users() {
            writeln!(self.output, "{user}")?;
            writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;
        }
        Ok(())
    }

    fn list_videos(&mut self) -> Result<()> {
        if self.catalog.videos().is_empty() {
            writeln!(self.output, "\nNo videos in the system.")?;
            return Ok(());
        }

        self.rule("ALL VIDEOS")?;
        for video in self.catalog.videos() {
            writeln!(self.output, "\n{video}")?;
            writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;
        }
        Ok(())
    }

    fn list_comments(&mut self) -> Result<()> {
        if self.catalog.comments().next().is_none() {
            writeln!(self.output, "\nNo comments in the system.")?;
            return Ok(());
        }

        self.rule("ALL COMMENTS")?;
        for comment in self.catalog.comments() {
            writeln!(self.output, "\n{comment}")?;
            writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;
        }
        Ok(())
    }

    fn search_user(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter User ID to search: ")?;
        let user = self.catalog.user(&id)?;
        writeln!(self.output, "\nUser found:\n{user}")?;
        Ok(())
    }

    fn search_video(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter Video ID to search: ")?;
        let video = self.catalog.video(&id)?;
        writeln!(self.output, "\nVideo found:\n{video}")?;
        Ok(())
    }

    fn delete_user(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter User ID to delete: ")?;
        let user = self.catalog.delete_user(&id)?;
        writeln!(self.output, "User {} deleted successfully!", user.username)?;
        Ok(())
    }

    fn delete_video(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter Video ID to delete: ")?;
        let video = self.catalog.delete_video(&id)?;
        writeln!(self.output, "Video '{}' deleted successfully!", video.title)?;
        Ok(())
    }

    fn display_video_details(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter Video ID: ")?;
        let video = self.catalog.video(&id)?;
        writeln!(self.output, "\n{video}")?;

        writeln!(self.output, "\nComments on this video:")?;
        for comment in &video.comments {
            writeln!(self.output, "\n{comment}")?;
        }

        if let Some(result) = self.catalog.result(&id) {
            writeln!(self.output, "\nAnalysis Result:\n{result}")?;
        }
        Ok(())
    }

    fn update_user(&mut self) -> Result<()> {
        let id = self.prompt("\nEnter User ID to update: ")?;
        self.catalog.user(&id)?;
        let username = self.prompt("New Username (blank to keep): ")?;
        let email = self.prompt("New Email (blank to keep): ")?;

        let user = self.catalog.update_user(
            &id,
            Some(username.as_str()).filter(|s| !s.is_empty()),
            Some(email.as_str()).filter(|s| !s.is_empty()),
        )?;
        writeln!(self.output, "\nUser updated:\n{user}")?;
        Ok(())
    }

    fn watch_video(&mut self) -> Result<()> {
        let viewer_id = self.prompt("\nEnter Viewer ID: ")?;
        let video_id = self.prompt("Enter Video ID: ")?;

        self.catalog.watch_video(&viewer_id, &video_id)?;
        let username = &self.catalog.user(&viewer_id)?.username;
        let title = &self.catalog.video(&video_id)?.title;
        writeln!(self.output, "{username} is watching: {title}")?;
        Ok(())
    }

    fn react_to_comment(&mut self) -> Result<()> {
        let video_id = self.prompt("\nEnter Video ID: ")?;
        let comment_id = self.prompt("Enter Comment ID: ")?;
        writeln!(self.output, "1. Like")?;
        writeln!(self.output, "2. Dislike")?;
        let reaction = match self.prompt("Choice: ")?.as_str() {
            "1" => Reaction::Like,
            "2" => Reaction::Dislike,
            _ => {
                writeln!(self.output, "Invalid choice!")?;
                return Ok(());
            }
        };

        let comment = self.catalog.react(&video_id, &comment_id, reaction)?;
        writeln!(
            self.output,
            "Likes: {}, Dislikes: {}",
            comment.likes, comment.dislikes
        )?;
        Ok(())
    }

    fn save_result(&mut self) -> Result<()> {
        let video_id = self.prompt("\nEnter Video ID: ")?;
        self.catalog.video(&video_id)?;
        let Some(result) = self.catalog.result(&video_id) else {
            writeln!(
                self.output,
                "\nThis video has not been analyzed yet. Analyze it first!"
            )?;
            return Ok(());
        };

        let path = result.save(&self.output_dir)?;
        writeln!(self.output, "Result saved to {}", path.display())?;
        Ok(())
    }

    fn export_catalog(&mut self) -> Result<()> {
        let path = parser::export_snapshot(&self.catalog, &self.output_dir)?;
        writeln!(self.output, "Catalog exported to {}", path.display())?;
        Ok(())
    }

    fn plot_video(&mut self) -> Result<()> {
        let video_id = self.prompt("\nEnter Video ID: ")?;
        let video = self.catalog.video(&video_id)?;
        if video.comments.is_empty() {
            writeln!(self.output, "\nThis video has no comments to plot!")?;
            return Ok(());
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_sentiment.png", video.id));
        let scores = self.analyzer.score_comments(&video.comments);
        plotter::plot_sentiment(video, &scores, &path)?;
        writeln!(self.output, "Plot written to {}", path.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run_menu(catalog: Catalog, output_dir: PathBuf, script: &str) -> (Catalog, String) {
        let mut menu = Menu::new(catalog, output_dir, Cursor::new(script.to_string()), Vec::new());
        menu.run().unwrap();
        let Menu {
            catalog, output, ..
        } = menu;
        (catalog, String::from_utf8(output).unwrap())
    }

    fn demo_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .create_user("u1", "alice", "alice@example.com", UserKind::Creator)
            .unwrap();
        catalog
            .create_user("u2", "bob", "bob@example.com", UserKind::Viewer)
            .unwrap();
        catalog
            .create_video("u1", "v1", "Demo Video", "http://example.com/v1", 120, "Education")
            .unwrap();
        for (id, content) in [
            ("c1", "This is great, I love it!"),
            ("c2", "Not bad but could be better"),
            ("c3", "Terrible content, worst ever"),
        ] {
            catalog.add_comment("v1", "u2", id, content).unwrap();
        }
        catalog
    }

    #[test]
    fn builds_catalog_from_scratch() {
        let script = "\
1\n2\nu1\nalice\nalice@example.com\n\n\
1\n3\nu2\nbob\nbob@example.com\n\n\
2\nu1\nv1\nDemo Video\nhttp://example.com/v1\n120\nEducation\n\n\
3\nv1\nu2\nc1\nThis is great, I love it!\n\n\
0\n";
        let dir = tempfile::tempdir().unwrap();
        let (catalog, output) = run_menu(Catalog::new(), dir.path().to_path_buf(), script);

        assert_eq!(catalog.users().len(), 2);
        assert_eq!(catalog.video("v1").unwrap().comments.len(), 1);
        assert!(output.contains("Video Creator alice created successfully!"));
        assert!(output.contains("Video 'Demo Video' created successfully!"));
        assert!(output.contains("Comment added successfully!"));
        assert!(output.contains("Goodbye!"));
    }

    #[test]
    fn analyzes_and_stores_result() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, output) =
            run_menu(demo_catalog(), dir.path().to_path_buf(), "4\nv1\n\n12\nv1\n\n0\n");

        assert!(output.contains("Analyzing 3 comments..."));
        assert!(output.contains("Quality Score: 3.33/10"));
        assert!(output.contains("Not recommended. This video has poor reviews."));
        assert!(output.contains("Analysis Result:"));
        assert_eq!(catalog.result("v1").unwrap().quality_score(), 3.33);
    }

    #[test]
    fn video_without_comments_is_not_analyzed() {
        let mut catalog = demo_catalog();
        catalog
            .create_video("u1", "v2", "Silent", "", 10, "")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (catalog, output) = run_menu(catalog, dir.path().to_path_buf(), "4\nv2\n\n0\n");

        assert!(output.contains("This video has no comments to analyze!"));
        assert!(catalog.result("v2").is_none());
    }

    #[test]
    fn store_errors_keep_the_menu_running() {
        let dir = tempfile::tempdir().unwrap();
        let script = "8\nnobody\n\n2\nu1\nv2\nTitle\n\nsoon\n\n99\n\n0\n";
        let (catalog, output) = run_menu(demo_catalog(), dir.path().to_path_buf(), script);

        assert!(output.contains("User not found: nobody"));
        assert!(output.contains("duration must be a whole number"));
        assert!(output.contains("Invalid choice! Please try again."));
        assert!(output.contains("Goodbye!"));
        assert!(catalog.video("v2").is_err());
    }

    #[test]
    fn closed_input_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let (_, output) = run_menu(demo_catalog(), dir.path().to_path_buf(), "5\n");
        assert!(output.contains("ALL USERS"));
        assert!(!output.contains("Goodbye!"));
    }

    #[test]
    fn watch_react_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let script = "13\nu2\nv1\n\n14\nv1\nc1\n1\n\n10\nu2\n\n7\n\n11\nv1\n\n0\n";
        let (catalog, output) = run_menu(demo_catalog(), dir.path().to_path_buf(), script);

        assert!(output.contains("bob is watching: Demo Video"));
        assert!(output.contains("Likes: 1, Dislikes: 0"));
        assert!(output.contains("User bob deleted successfully!"));
        assert!(output.contains("Comment by bob: This is great, I love it!"));
        assert!(output.contains("Video 'Demo Video' deleted successfully!"));
        assert!(catalog.videos().is_empty());
    }

    #[test]
    fn updates_user_profile() {
        let dir = tempfile::tempdir().unwrap();
        let script = "18\nu2\nrobert\n\n\n7\n\n0\n";
        let (catalog, output) = run_menu(demo_catalog(), dir.path().to_path_buf(), script);

        let user = catalog.user("u2").unwrap();
        assert_eq!(user.username, "robert");
        assert_eq!(user.email, "bob@example.com");
        assert!(output.contains("Username: robert"));
        assert!(output.contains("Comment by robert: This is great, I love it!"));
    }

    #[test]
    fn saves_result_and_exports_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let script = "15\nv1\n\n4\nv1\n\n15\nv1\n\n16\n\n0\n";
        let (_, output) = run_menu(demo_catalog(), dir.path().to_path_buf(), script);

        assert!(output.contains("This video has not been analyzed yet."));
        assert!(output.contains("Result saved to"));
        assert!(dir.path().join(parser::SNAPSHOT_FILE_NAME).exists());

        let saved = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("result_"))
            .count();
        assert_eq!(saved, 1);
    }
}
